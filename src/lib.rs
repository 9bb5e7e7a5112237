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
//! Read and apply BIOS settings on a fleet of BMCs through Redfish.
//!
//! Every operation opens its own Redfish session per node, performs one read or
//! one conditional write, and always logs the session out again. Multi-node
//! operations either isolate per-node failures or stop at the first failure,
//! see [`fleet::FailurePolicy`].

use reqwest::{header::HeaderName, StatusCode};

pub mod bios;
mod error;
pub mod fleet;
mod jsonmap;
pub mod model;
mod network;
pub mod resource;
pub mod session;
pub mod settings;
#[cfg(test)]
mod testing;

pub use bios::{get_bios_settings, get_bios_versions, set_bios_settings, set_boot_once};
pub use error::RedfishError;
pub use fleet::{FailurePolicy, FleetResult};
pub use model::{AttributeSet, AttributeValue, BootOverride, BootSource};
pub use network::{
    Endpoint, RedfishClientPool, RedfishClientPoolBuilder, RedfishHttpClient, REDFISH_ENDPOINT,
};
pub use resource::Precondition;
pub use session::{with_session, Credential, Session, SessionGuard};

/// Computer system resource. Carries `BiosVersion`, `@odata.etag` and `Boot`.
pub const SYSTEM_PATH: &str = "Systems/Self";
/// Current BIOS attributes, under the `Attributes` field.
pub const BIOS_PATH: &str = "Systems/Self/Bios";
/// Pending BIOS settings. PATCH target for attribute changes, applied on next reboot.
pub const BIOS_SETTINGS_PATH: &str = "Systems/Self/Bios/SD";
pub const SESSIONS_PATH: &str = "SessionService/Sessions";

pub const ATTRIBUTES_FIELD: &str = "Attributes";
pub const BIOS_VERSION_FIELD: &str = "BiosVersion";
pub const ETAG_FIELD: &str = "@odata.etag";

/// Status and decoded body of one Redfish request.
///
/// The transport does not judge the status code, callers decide what counts as success.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status_code: StatusCode,
    /// JSON body, if the BMC sent one.
    pub body: Option<serde_json::Value>,
    /// Raw body text, kept for diagnostics.
    pub text: String,
}

/// Interface to a single BMC. All calls except `node` make one HTTP request.
pub trait Transport {
    /// Address of the BMC this transport talks to.
    fn node(&self) -> &str;

    /// Create a Redfish session with the given credential.
    fn login(&self, credential: &Credential) -> Result<Session, RedfishError>;

    fn get(&self, session: &Session, api: &str) -> Result<RawResponse, RedfishError>;

    fn patch(
        &self,
        session: &Session,
        api: &str,
        headers: &[(HeaderName, String)],
        body: &serde_json::Value,
    ) -> Result<RawResponse, RedfishError>;

    /// Delete the session on the BMC.
    fn logout(&self, session: &Session) -> Result<(), RedfishError>;
}

/// Creates a [`Transport`] for a node address.
pub trait Connector {
    fn connect(&self, node: &str) -> Box<dyn Transport>;
}
