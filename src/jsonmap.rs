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

// jsonmap.rs
// Helpers for pulling fields out of Redfish JSON bodies, with errors that
// name the BMC and the URL the body came from.

use std::any::type_name;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::RedfishError;

fn missing_field_error(field: &str, node: &str, url: &str) -> RedfishError {
    RedfishError::MissingField {
        node: node.to_string(),
        field: field.to_string(),
        url: url.to_string(),
    }
}

fn invalid_type_error(field: &str, expected_type: &str, node: &str, url: &str) -> RedfishError {
    RedfishError::InvalidFieldType {
        node: node.to_string(),
        field: field.to_string(),
        expected_type: expected_type.to_string(),
        url: url.to_string(),
    }
}

// get_value retrieves a JSON value from a map, returning MissingField
// if the key is not there.
pub fn get_value<'a>(
    map: &'a Map<String, Value>,
    field: &str,
    node: &str,
    url: &str,
) -> Result<&'a Value, RedfishError> {
    map.get(field)
        .ok_or_else(|| missing_field_error(field, node, url))
}

// get_str extracts a string value, failing if it is missing or not a string.
pub fn get_str<'a>(
    map: &'a Map<String, Value>,
    field: &str,
    node: &str,
    url: &str,
) -> Result<&'a str, RedfishError> {
    get_value(map, field, node, url)?
        .as_str()
        .ok_or_else(|| invalid_type_error(field, "string", node, url))
}

// extract removes a field from a map and deserializes it to T.
pub fn extract<T>(
    map: &mut Map<String, Value>,
    field: &str,
    node: &str,
    url: &str,
) -> Result<T, RedfishError>
where
    T: DeserializeOwned,
{
    let json = map
        .remove(field)
        .ok_or_else(|| missing_field_error(field, node, url))?;
    serde_json::from_value::<T>(json)
        .map_err(|_| invalid_type_error(field, type_name::<T>(), node, url))
}
