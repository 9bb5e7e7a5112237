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
// In-memory BMCs that record every request, for unit tests.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use reqwest::{header::HeaderName, header::IF_MATCH, StatusCode};
use serde_json::{json, Value};

use crate::{Connector, Credential, RawResponse, RedfishError, Session, Transport};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Login(String),
    Get {
        node: String,
        api: String,
    },
    Patch {
        node: String,
        api: String,
        if_match: String,
        body: Value,
    },
    Logout(String),
}

#[derive(Debug, Clone)]
pub(crate) struct FakeBmc {
    unreachable: bool,
    login_status: u16,
    gets: HashMap<String, (u16, String)>,
    patch_status: u16,
    logout_status: u16,
}

impl Default for FakeBmc {
    fn default() -> Self {
        FakeBmc {
            unreachable: false,
            login_status: 201,
            gets: HashMap::new(),
            patch_status: 204,
            logout_status: 204,
        }
    }
}

impl FakeBmc {
    pub(crate) fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub(crate) fn login_status(mut self, status: u16) -> Self {
        self.login_status = status;
        self
    }

    pub(crate) fn get(self, api: &str, status: u16, body: Value) -> Self {
        self.get_text(api, status, &body.to_string())
    }

    /// Serves `text` verbatim, JSON or not.
    pub(crate) fn get_text(mut self, api: &str, status: u16, text: &str) -> Self {
        self.gets.insert(api.to_string(), (status, text.to_string()));
        self
    }

    pub(crate) fn patch_status(mut self, status: u16) -> Self {
        self.patch_status = status;
        self
    }

    pub(crate) fn logout_status(mut self, status: u16) -> Self {
        self.logout_status = status;
        self
    }
}

/// A set of fake BMCs keyed by node. Nodes that were never added are unreachable.
#[derive(Default)]
pub(crate) struct FakeFleet {
    nodes: HashMap<String, FakeBmc>,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl FakeFleet {
    pub(crate) fn new() -> Self {
        FakeFleet::default()
    }

    pub(crate) fn with_node(mut self, node: &str, bmc: FakeBmc) -> Self {
        self.nodes.insert(node.to_string(), bmc);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn logouts(&self, node: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Logout(n) if n == node))
            .count()
    }

    pub(crate) fn patches(&self, node: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Patch { node: n, .. } if n == node))
            .count()
    }
}

impl Connector for FakeFleet {
    fn connect(&self, node: &str) -> Box<dyn Transport> {
        Box::new(FakeTransport {
            node: node.to_string(),
            bmc: self
                .nodes
                .get(node)
                .cloned()
                .unwrap_or_else(|| FakeBmc::default().unreachable()),
            calls: Rc::clone(&self.calls),
        })
    }
}

struct FakeTransport {
    node: String,
    bmc: FakeBmc,
    calls: Rc<RefCell<Vec<Call>>>,
}

// Decodes like the HTTP transport: a body that is not JSON is kept as text only.
fn response(status: u16, text: &str) -> RawResponse {
    RawResponse {
        status_code: StatusCode::from_u16(status).unwrap(),
        body: serde_json::from_str(text).ok(),
        text: text.to_string(),
    }
}

// reqwest errors can't be built directly, so make one from a bad URL.
fn connection_error(node: &str) -> RedfishError {
    let source = reqwest::blocking::Client::new()
        .get("not a url")
        .send()
        .unwrap_err();
    RedfishError::ConnectionError {
        node: node.to_string(),
        url: format!("https://{node}/redfish/v1/SessionService/Sessions"),
        source,
    }
}

impl Transport for FakeTransport {
    fn node(&self) -> &str {
        &self.node
    }

    fn login(&self, _credential: &Credential) -> Result<Session, RedfishError> {
        self.calls.borrow_mut().push(Call::Login(self.node.clone()));
        if self.bmc.unreachable {
            return Err(connection_error(&self.node));
        }
        let status_code = StatusCode::from_u16(self.bmc.login_status).unwrap();
        if !status_code.is_success() {
            return Err(RedfishError::AuthError {
                node: self.node.clone(),
                status_code,
            });
        }
        Ok(Session::new(
            &self.node,
            format!("token-{}", self.node),
            Some("/redfish/v1/SessionService/Sessions/1".to_string()),
        ))
    }

    fn get(&self, _session: &Session, api: &str) -> Result<RawResponse, RedfishError> {
        self.calls.borrow_mut().push(Call::Get {
            node: self.node.clone(),
            api: api.to_string(),
        });
        Ok(match self.bmc.gets.get(api) {
            Some((status, text)) => response(*status, text),
            None => response(404, &json!({"error": "not found"}).to_string()),
        })
    }

    fn patch(
        &self,
        _session: &Session,
        api: &str,
        headers: &[(HeaderName, String)],
        body: &Value,
    ) -> Result<RawResponse, RedfishError> {
        let if_match = headers
            .iter()
            .find(|(name, _)| name == IF_MATCH)
            .map(|(_, value)| value.clone())
            .unwrap_or_default();
        self.calls.borrow_mut().push(Call::Patch {
            node: self.node.clone(),
            api: api.to_string(),
            if_match,
            body: body.clone(),
        });
        Ok(RawResponse {
            status_code: StatusCode::from_u16(self.bmc.patch_status).unwrap(),
            body: None,
            text: String::new(),
        })
    }

    fn logout(&self, session: &Session) -> Result<(), RedfishError> {
        self.calls.borrow_mut().push(Call::Logout(self.node.clone()));
        let status_code = StatusCode::from_u16(self.bmc.logout_status).unwrap();
        if !status_code.is_success() {
            return Err(RedfishError::RedfishStatusError {
                node: self.node.clone(),
                url: session.location().unwrap_or_default().to_string(),
                status_code,
                body: String::new(),
            });
        }
        Ok(())
    }
}
