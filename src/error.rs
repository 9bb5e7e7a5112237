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
use std::path::PathBuf;

use reqwest::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum RedfishError {
    /// Network, TLS, DNS or timeout failure talking to the BMC.
    #[error("Network error talking to BMC {node} at {url}. {source}")]
    ConnectionError {
        node: String,
        url: String,
        source: reqwest::Error,
    },

    #[error("Login rejected by BMC {node}: HTTP {status_code}")]
    AuthError {
        node: String,
        status_code: StatusCode,
    },

    #[error("Login to BMC {node} succeeded but no {header} header was returned")]
    MissingSessionToken { node: String, header: String },

    #[error("Unexpected HTTP {status_code} from BMC {node} at {url}. Redfish response: {body}")]
    RedfishStatusError {
        node: String,
        url: String,
        status_code: StatusCode,
        body: String,
    },

    #[error("Missing field {field} in response from BMC {node} at {url}")]
    MissingField {
        node: String,
        field: String,
        url: String,
    },

    #[error("Field {field} should be {expected_type} in response from BMC {node} at {url}")]
    InvalidFieldType {
        node: String,
        field: String,
        expected_type: String,
        url: String,
    },

    #[error("Could not read settings file {}. {source}", .path.display())]
    FileFormatError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not deserialize response from {url}. Body: {body}. {source}")]
    JsonDeserializeError {
        url: String,
        body: String,
        source: serde_json::Error,
    },

    #[error("Could not serialize request body for {url}. Obj: {object_debug}. {source}")]
    JsonSerializeError {
        url: String,
        object_debug: String,
        source: serde_json::Error,
    },
}

impl RedfishError {
    /// The BMC the error came from, when the error is tied to one.
    pub fn node(&self) -> Option<&str> {
        match self {
            RedfishError::ConnectionError { node, .. }
            | RedfishError::AuthError { node, .. }
            | RedfishError::MissingSessionToken { node, .. }
            | RedfishError::RedfishStatusError { node, .. }
            | RedfishError::MissingField { node, .. }
            | RedfishError::InvalidFieldType { node, .. } => Some(node),
            RedfishError::FileFormatError { .. }
            | RedfishError::JsonDeserializeError { .. }
            | RedfishError::JsonSerializeError { .. } => None,
        }
    }
}
