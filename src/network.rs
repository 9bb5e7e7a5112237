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
use std::time::Duration;

use reqwest::{
    blocking::Client as HttpClient, blocking::ClientBuilder as HttpClientBuilder,
    header::HeaderName, header::HeaderValue, header::ACCEPT, header::CONTENT_TYPE,
    header::LOCATION, Method,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::{
    jsonmap, Connector, Credential, RawResponse, RedfishError, Session, Transport, SESSIONS_PATH,
};

pub const REDFISH_ENDPOINT: &str = "redfish/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const SESSION_TOKEN_HEADER: &str = "X-Auth-Token";

#[derive(Debug)]
pub struct RedfishClientPoolBuilder {
    timeout: Duration,
    accept_invalid_certs: bool,
    plain_http: bool,
}

impl RedfishClientPoolBuilder {
    /// Prevents the Redfish Client from accepting self signed certificates
    /// and other invalid certificates.
    ///
    /// By default self signed certificates will be accepted, since BMCs usually
    /// use those.
    pub fn reject_invalid_certs(mut self) -> RedfishClientPoolBuilder {
        self.accept_invalid_certs = false;
        self
    }

    /// Overwrites the timeout that will be applied to every request
    pub fn timeout(mut self, timeout: Duration) -> RedfishClientPoolBuilder {
        self.timeout = timeout;
        self
    }

    /// Talk plain HTTP instead of HTTPS. Only useful against mockup servers.
    pub fn plain_http(mut self) -> RedfishClientPoolBuilder {
        self.plain_http = true;
        self
    }

    /// Builds a Redfish Client Network Configuration
    pub fn build(&self) -> Result<RedfishClientPool, reqwest::Error> {
        let http_client = HttpClientBuilder::new()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .timeout(self.timeout)
            .build()?;
        Ok(RedfishClientPool {
            http_client,
            scheme: if self.plain_http { "http" } else { "https" },
        })
    }
}

/// The endpoint that the redfish client connects to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Endpoint {
    /// Hostname or IP address of BMC
    pub host: String,
    /// BMC port. If absent the default port of the scheme will be used
    pub port: Option<u16>,
}

impl Endpoint {
    /// Splits a node address of the form `host`, `host:port` or `[v6addr]:port`.
    pub fn from_node(node: &str) -> Endpoint {
        if let Some((host, port)) = node.rsplit_once(':') {
            if !host.contains(':') || (host.starts_with('[') && host.ends_with(']')) {
                if let Ok(port) = port.parse::<u16>() {
                    return Endpoint {
                        host: host.to_string(),
                        port: Some(port),
                    };
                }
            }
        }
        Endpoint {
            host: node.to_string(),
            port: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedfishClientPool {
    http_client: HttpClient,
    scheme: &'static str,
}

impl RedfishClientPool {
    /// Returns Builder for configuring a Redfish HTTP connection pool
    pub fn builder() -> RedfishClientPoolBuilder {
        RedfishClientPoolBuilder {
            timeout: DEFAULT_TIMEOUT,
            // BMCs often have a self-signed cert, so usually this has to be true
            accept_invalid_certs: true,
            plain_http: false,
        }
    }

    /// Creates a Redfish BMC client for a node. No request is made until login.
    pub fn create_client(&self, node: &str) -> RedfishHttpClient {
        RedfishHttpClient {
            node: node.to_string(),
            base_url: base_url(self.scheme, &Endpoint::from_node(node)),
            http_client: self.http_client.clone(),
        }
    }
}

impl Connector for RedfishClientPool {
    fn connect(&self, node: &str) -> Box<dyn Transport> {
        Box::new(self.create_client(node))
    }
}

fn base_url(scheme: &str, endpoint: &Endpoint) -> String {
    match endpoint.port {
        Some(p) => format!("{scheme}://{}:{p}", endpoint.host),
        None => format!("{scheme}://{}", endpoint.host),
    }
}

/// A HTTP client which targets a single BMC
pub struct RedfishHttpClient {
    node: String,
    base_url: String,
    http_client: HttpClient,
}

impl RedfishHttpClient {
    fn url(&self, api: &str) -> String {
        format!("{}/{}/{}", self.base_url, REDFISH_ENDPOINT, api)
    }

    /// Resolves a session location, which BMCs return either as a full URL or as an
    /// absolute path. Anything else is relative to the Redfish root.
    fn session_url(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else if location.starts_with('/') {
            format!("{}{}", self.base_url, location)
        } else {
            self.url(location)
        }
    }

    fn connection_error(&self, url: &str, source: reqwest::Error) -> RedfishError {
        RedfishError::ConnectionError {
            node: self.node.clone(),
            url: url.to_string(),
            source,
        }
    }

    // All the authenticated HTTP requests happen from here.
    fn req(
        &self,
        method: Method,
        url: String,
        session: &Session,
        headers: &[(HeaderName, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, RedfishError> {
        let body_enc = body.map(|b| b.to_string());
        debug!(
            "TX {} {} {}",
            method,
            url,
            body_enc.as_deref().unwrap_or_default()
        );

        let mut req_b = self
            .http_client
            .request(method, &url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(SESSION_TOKEN_HEADER, session.token());
        for (name, value) in headers {
            req_b = req_b.header(name, value);
        }
        if let Some(b) = body_enc {
            req_b = req_b.body(b);
        }
        let response = req_b
            .send()
            .map_err(|e| self.connection_error(&url, e))?;
        let status_code = response.status();
        // read the body even if not status 2XX, because BMCs give useful error messages as JSON
        let text = response
            .text()
            .map_err(|e| self.connection_error(&url, e))?;
        if text.is_empty() {
            debug!("RX {status_code}");
            return Ok(RawResponse {
                status_code,
                body: None,
                text,
            });
        }
        debug!("RX {status_code} {text}");
        // non-JSON bodies (HTML error pages, bare "OK") are kept as text only,
        // callers judge the status before they look at the body
        let body = serde_json::from_str(&text).ok();
        Ok(RawResponse {
            status_code,
            body,
            text,
        })
    }
}

impl Transport for RedfishHttpClient {
    fn node(&self) -> &str {
        &self.node
    }

    fn login(&self, credential: &Credential) -> Result<Session, RedfishError> {
        let url = self.url(SESSIONS_PATH);
        let body = json!({
            "UserName": credential.username(),
            "Password": credential.password(),
        });
        debug!("TX POST {} (credentials for {})", url, credential.username());
        let response = self
            .http_client
            .post(&url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body.to_string())
            .send()
            .map_err(|e| self.connection_error(&url, e))?;
        let status_code = response.status();
        debug!("RX {status_code}");
        if !status_code.is_success() {
            return Err(RedfishError::AuthError {
                node: self.node.clone(),
                status_code,
            });
        }

        let headers = response.headers();
        let token = headers
            .get(SESSION_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| RedfishError::MissingSessionToken {
                node: self.node.clone(),
                header: SESSION_TOKEN_HEADER.to_string(),
            })?;
        let mut location = headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if location.is_none() {
            // some BMCs only name the session in the body
            let text = response
                .text()
                .map_err(|e| self.connection_error(&url, e))?;
            if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(&text) {
                location = jsonmap::get_str(&map, "@odata.id", &self.node, &url)
                    .map(str::to_string)
                    .or_else(|_| {
                        jsonmap::get_str(&map, "Id", &self.node, &url)
                            .map(|id| format!("{SESSIONS_PATH}/{id}"))
                    })
                    .ok();
            }
        }
        Ok(Session::new(&self.node, token, location))
    }

    fn get(&self, session: &Session, api: &str) -> Result<RawResponse, RedfishError> {
        self.req(Method::GET, self.url(api), session, &[], None)
    }

    fn patch(
        &self,
        session: &Session,
        api: &str,
        headers: &[(HeaderName, String)],
        body: &serde_json::Value,
    ) -> Result<RawResponse, RedfishError> {
        self.req(Method::PATCH, self.url(api), session, headers, Some(body))
    }

    fn logout(&self, session: &Session) -> Result<(), RedfishError> {
        let Some(location) = session.location() else {
            warn!("No session location for {}, session left to expire", self.node);
            return Ok(());
        };
        let url = self.session_url(location);
        let response = self.req(Method::DELETE, url.clone(), session, &[], None)?;
        if !response.status_code.is_success() {
            return Err(RedfishError::RedfishStatusError {
                node: self.node.clone(),
                url,
                status_code: response.status_code,
                body: response.text,
            });
        }
        Ok(())
    }
}
