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
//! BIOS settings files.
//!
//! One `key=value` per line. Lines without `=` are skipped, which leaves room
//! for comments and blank lines. The line is trimmed, then split on `=`: the
//! first part is the key and the second the value, so anything after a second
//! `=` is dropped. Values are coerced with [`AttributeValue::coerce`]. A later
//! line for the same key wins.

use std::path::Path;

use tracing::debug;

use crate::{AttributeSet, AttributeValue, RedfishError};

pub fn parse_settings(text: &str) -> AttributeSet {
    let mut settings = AttributeSet::new();
    for line in text.lines() {
        if !line.contains('=') {
            continue;
        }
        let mut parts = line.trim().split('=');
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        settings.insert(key, AttributeValue::coerce(value));
    }
    settings
}

/// Reads and parses a UTF-8 settings file.
pub fn load_settings(path: &Path) -> Result<AttributeSet, RedfishError> {
    let text = std::fs::read_to_string(path).map_err(|e| RedfishError::FileFormatError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let settings = parse_settings(&text);
    debug!("Loaded {} BIOS settings from {}", settings.len(), path.display());
    Ok(settings)
}
