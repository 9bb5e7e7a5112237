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
//! GET and conditional PATCH against a single Redfish resource.
//!
//! A read succeeds only on `200 OK`. A PATCH succeeds only on `204 No Content`,
//! which is how the BMC says the change is staged and applied on next reboot.

use std::fmt;

use reqwest::{header::IF_MATCH, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{jsonmap, RawResponse, RedfishError, SessionGuard, REDFISH_ENDPOINT};

/// Value of the `If-Match` header guarding a PATCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// `*`, apply whatever the current state of the resource is.
    Any,
    /// Apply only if the resource still has this ETag.
    ETag(String),
}

impl Precondition {
    pub fn header_value(&self) -> &str {
        match self {
            Precondition::Any => "*",
            Precondition::ETag(etag) => etag,
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_value())
    }
}

fn status_error(guard: &SessionGuard, api: &str, response: RawResponse) -> RedfishError {
    RedfishError::RedfishStatusError {
        node: guard.node().to_string(),
        url: format!("/{REDFISH_ENDPOINT}/{api}"),
        status_code: response.status_code,
        body: response.text,
    }
}

/// GETs `api` and returns its JSON object. Anything but `200 OK` is an error.
pub fn read_resource(
    guard: &SessionGuard,
    api: &str,
) -> Result<Map<String, Value>, RedfishError> {
    let response = guard.transport().get(guard.session(), api)?;
    if response.status_code != StatusCode::OK {
        return Err(status_error(guard, api, response));
    }
    let source = match response.body {
        Some(Value::Object(map)) => return Ok(map),
        None if response.text.is_empty() => return Ok(Map::new()),
        // the transport keeps non-JSON bodies as text only
        None => match serde_json::from_str::<Value>(&response.text) {
            Err(e) => e,
            Ok(_) => <serde_json::Error as serde::de::Error>::custom("expected a JSON object"),
        },
        Some(_) => <serde_json::Error as serde::de::Error>::custom("expected a JSON object"),
    };
    Err(RedfishError::JsonDeserializeError {
        url: format!("/{REDFISH_ENDPOINT}/{api}"),
        body: response.text,
        source,
    })
}

/// GETs `api` and deserializes its top-level `field`.
///
/// Fails with `MissingField` if the field is absent from an otherwise good response.
pub fn read_field<T>(guard: &SessionGuard, api: &str, field: &str) -> Result<T, RedfishError>
where
    T: DeserializeOwned,
{
    let mut map = read_resource(guard, api)?;
    jsonmap::extract(&mut map, field, guard.node(), &format!("/{REDFISH_ENDPOINT}/{api}"))
}

/// PATCHes `body` onto `api` with `If-Match: <precondition>`.
///
/// Only `204 No Content` is success; in particular `200 OK` is rejected.
pub fn patch_if_match<B>(
    guard: &SessionGuard,
    api: &str,
    precondition: &Precondition,
    body: &B,
) -> Result<(), RedfishError>
where
    B: Serialize + fmt::Debug,
{
    let body_json = serde_json::to_value(body).map_err(|e| RedfishError::JsonSerializeError {
        url: format!("/{REDFISH_ENDPOINT}/{api}"),
        object_debug: format!("{body:?}"),
        source: e,
    })?;
    debug!("PATCH {api} on {} If-Match {precondition}", guard.node());
    let headers = [(IF_MATCH, precondition.header_value().to_string())];
    let response = guard
        .transport()
        .patch(guard.session(), api, &headers, &body_json)?;
    if response.status_code != StatusCode::NO_CONTENT {
        return Err(status_error(guard, api, response));
    }
    Ok(())
}
