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
//! Running one operation over a list of nodes.
//!
//! Nodes are handled one at a time in input order. What happens when a node
//! fails is chosen per operation with [`FailurePolicy`].

use tracing::error;

use crate::RedfishError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure against the node and carry on with the next one.
    Isolate,
    /// Stop at the first failure. Later nodes are not touched, earlier nodes keep
    /// whatever was done to them.
    FailFast,
}

/// Per-node outcomes, in the order the nodes were given. Duplicate nodes get one
/// entry each.
#[derive(Debug)]
pub struct FleetResult<T> {
    entries: Vec<(String, Result<T, RedfishError>)>,
}

impl<T> Default for FleetResult<T> {
    fn default() -> Self {
        FleetResult {
            entries: Vec::new(),
        }
    }
}

impl<T> FleetResult<T> {
    pub(crate) fn new() -> Self {
        FleetResult::default()
    }

    pub(crate) fn record(&mut self, node: &str, outcome: Result<T, RedfishError>) {
        self.entries.push((node.to_string(), outcome));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outcome of the first entry for `node`.
    pub fn get(&self, node: &str) -> Option<&Result<T, RedfishError>> {
        self.entries
            .iter()
            .find(|(n, _)| n == node)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<T, RedfishError>)> {
        self.entries
            .iter()
            .map(|(node, outcome)| (node.as_str(), outcome))
    }

    pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().filter_map(|(node, outcome)| match outcome {
            Ok(v) => Some((node.as_str(), v)),
            Err(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &RedfishError)> {
        self.entries.iter().filter_map(|(node, outcome)| match outcome {
            Ok(_) => None,
            Err(e) => Some((node.as_str(), e)),
        })
    }

    pub fn is_all_ok(&self) -> bool {
        self.entries.iter().all(|(_, outcome)| outcome.is_ok())
    }

    /// Entries ordered by node, for display. Stable for duplicate nodes.
    pub fn sorted(mut self) -> Self {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }
}

/// Runs `op` for every node. A failure is logged, recorded, and the next node is tried.
pub fn run_isolated<T, F>(nodes: &[String], mut op: F) -> FleetResult<T>
where
    F: FnMut(&str) -> Result<T, RedfishError>,
{
    let mut results = FleetResult::new();
    for node in nodes {
        let outcome = op(node);
        if let Err(e) = &outcome {
            error!("Operation failed for node {node}: {e}");
        }
        results.record(node, outcome);
    }
    results
}

/// Runs `op` for every node, returning the first failure without trying the rest.
pub fn run_fail_fast<T, F>(nodes: &[String], mut op: F) -> Result<FleetResult<T>, RedfishError>
where
    F: FnMut(&str) -> Result<T, RedfishError>,
{
    let mut results = FleetResult::new();
    for node in nodes {
        let value = op(node)?;
        results.record(node, Ok(value));
    }
    Ok(results)
}

/// Runs `op` for every node under `policy`.
///
/// With `Isolate` this never returns `Err`; failures are in the `FleetResult`.
pub fn run<T, F>(
    policy: FailurePolicy,
    nodes: &[String],
    op: F,
) -> Result<FleetResult<T>, RedfishError>
where
    F: FnMut(&str) -> Result<T, RedfishError>,
{
    match policy {
        FailurePolicy::Isolate => Ok(run_isolated(nodes, op)),
        FailurePolicy::FailFast => run_fail_fast(nodes, op),
    }
}
