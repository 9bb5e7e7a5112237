/*
 * SPDX-FileCopyrightText: Copyright (c) 2023 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: MIT
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 */
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum BootSourceOverrideEnabled {
    Once,
    Continuous,
    Disabled,
}

impl fmt::Display for BootSourceOverrideEnabled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Boot devices that can be selected for a one time boot.
/// Subset of http://redfish.dmtf.org/schemas/v1/ComputerSystem.json#/definitions/BootSource
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum BootSource {
    Pxe,
    Cd,
    Usb,
    Hdd,
    BiosSetup,
}

impl BootSource {
    pub const ALL: [BootSource; 5] = [
        BootSource::Pxe,
        BootSource::Cd,
        BootSource::Usb,
        BootSource::Hdd,
        BootSource::BiosSetup,
    ];
}

impl fmt::Display for BootSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid boot source {0}, expected one of Pxe, Cd, Usb, Hdd, BiosSetup")]
pub struct InvalidBootSource(pub String);

impl FromStr for BootSource {
    type Err = InvalidBootSource;

    // Names are matched exactly, as Redfish spells them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BootSource::ALL
            .into_iter()
            .find(|b| b.to_string() == s)
            .ok_or_else(|| InvalidBootSource(s.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct BootOverride {
    pub boot_source_override_enabled: BootSourceOverrideEnabled,
    pub boot_source_override_target: BootSource,
}

impl BootOverride {
    /// Boot from `target` on the next boot only.
    pub fn once(target: BootSource) -> Self {
        BootOverride {
            boot_source_override_enabled: BootSourceOverrideEnabled::Once,
            boot_source_override_target: target,
        }
    }
}

/// Body of the PATCH to the computer system resource.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct SetBootOverride {
    pub boot: BootOverride,
}
