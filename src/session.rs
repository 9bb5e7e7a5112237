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
use std::fmt;

use tracing::debug;

use crate::{Connector, RedfishError, Transport};

/// BMC username and password. Shared read-only by every node of a batch.
#[derive(Clone)]
pub struct Credential {
    username: String,
    password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credential {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated Redfish session on one BMC.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    node: String,
    token: String,
    location: Option<String>,
}

impl Session {
    pub fn new(node: &str, token: String, location: Option<String>) -> Self {
        Session {
            node: node.to_string(),
            token,
            location,
        }
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    /// Value for the `X-Auth-Token` header.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// URI of the session resource, deleted on logout.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("node", &self.node)
            .field("token", &"<redacted>")
            .field("location", &self.location)
            .finish()
    }
}

/// Owns a logged in session and logs it out when closed or dropped.
///
/// A guard only exists once login succeeded, so a failed login never
/// triggers a logout. Logout errors are logged at debug level and dropped.
pub struct SessionGuard {
    transport: Box<dyn Transport>,
    session: Session,
    closed: bool,
}

impl SessionGuard {
    /// Logs in to `node`. Fails with `ConnectionError` or `AuthError`.
    pub fn open(
        connector: &dyn Connector,
        node: &str,
        credential: &Credential,
    ) -> Result<SessionGuard, RedfishError> {
        let transport = connector.connect(node);
        let session = transport.login(credential)?;
        debug!("Opened Redfish session on {node}");
        Ok(SessionGuard {
            transport,
            session,
            closed: false,
        })
    }

    pub fn node(&self) -> &str {
        self.transport.node()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// Logs the session out. Never fails.
    pub fn close(mut self) {
        self.logout();
    }

    fn logout(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match self.transport.logout(&self.session) {
            Ok(()) => debug!("Closed Redfish session on {}", self.session.node()),
            Err(e) => debug!("Ignoring logout failure on {}: {e}", self.session.node()),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.logout();
    }
}

/// Runs `op` inside a fresh session on `node`. The session is closed whatever
/// `op` returns, and a logout failure never replaces the result of `op`.
pub fn with_session<T, F>(
    connector: &dyn Connector,
    node: &str,
    credential: &Credential,
    op: F,
) -> Result<T, RedfishError>
where
    F: FnOnce(&SessionGuard) -> Result<T, RedfishError>,
{
    let guard = SessionGuard::open(connector, node, credential)?;
    let result = op(&guard);
    guard.close();
    result
}
