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
use tracing::{debug, info};

use crate::{
    fleet::{self, FailurePolicy},
    model::{SetBiosAttributes, SetBootOverride},
    resource::{patch_if_match, read_field, Precondition},
    with_session, AttributeSet, BootOverride, BootSource, Connector, Credential, FleetResult,
    RedfishError, ATTRIBUTES_FIELD, BIOS_PATH, BIOS_SETTINGS_PATH, BIOS_VERSION_FIELD,
    ETAG_FIELD, SYSTEM_PATH,
};

/// Current BIOS attributes of a single node.
pub fn get_bios_settings(
    connector: &dyn Connector,
    node: &str,
    credential: &Credential,
) -> Result<AttributeSet, RedfishError> {
    debug!("Getting bios settings for node: {node}");
    with_session(connector, node, credential, |s| {
        read_field(s, BIOS_PATH, ATTRIBUTES_FIELD)
    })
}

/// BIOS version of every node. A node that fails is recorded and skipped.
pub fn get_bios_versions(
    connector: &dyn Connector,
    nodes: &[String],
    credential: &Credential,
) -> FleetResult<String> {
    fleet::run_isolated(nodes, |node| {
        with_session(connector, node, credential, |s| {
            read_field(s, SYSTEM_PATH, BIOS_VERSION_FIELD)
        })
    })
}

/// Stages `attributes` on every node, unconditionally (`If-Match: *`).
///
/// Stops at the first node that fails. Nodes before it keep their staged
/// changes, nodes after it are not contacted. The changes apply on next reboot.
pub fn set_bios_settings(
    connector: &dyn Connector,
    nodes: &[String],
    credential: &Credential,
    attributes: &AttributeSet,
) -> Result<(), RedfishError> {
    let body = SetBiosAttributes { attributes };
    fleet::run(FailurePolicy::FailFast, nodes, |node| {
        info!("Setting bios settings for node: {node}");
        with_session(connector, node, credential, |s| {
            patch_if_match(s, BIOS_SETTINGS_PATH, &Precondition::Any, &body)
        })?;
        info!("Successfully set bios settings for node: {node}");
        Ok(())
    })?;
    Ok(())
}

/// Makes every node boot from `source` on its next boot only.
///
/// The PATCH is guarded by the system resource's current ETag, read in the same
/// session. A node without an ETag fails without being patched. Failures are
/// recorded per node and the other nodes are still tried.
pub fn set_boot_once(
    connector: &dyn Connector,
    nodes: &[String],
    credential: &Credential,
    source: BootSource,
) -> FleetResult<()> {
    let body = SetBootOverride {
        boot: BootOverride::once(source),
    };
    fleet::run_isolated(nodes, |node| {
        info!("Setting boot source for node: {node}");
        with_session(connector, node, credential, |s| {
            let etag: String = read_field(s, SYSTEM_PATH, ETAG_FIELD)?;
            patch_if_match(s, SYSTEM_PATH, &Precondition::ETag(etag), &body)
        })?;
        info!("Successfully set boot source for node: {node}");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{Call, FakeBmc, FakeFleet};
    use crate::AttributeValue;

    fn credential() -> Credential {
        Credential::new("admin", "secret")
    }

    fn nodes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn system(version: &str) -> serde_json::Value {
        json!({
            "@odata.id": "/redfish/v1/Systems/Self",
            "@odata.etag": format!("W/\"{version}\""),
            "BiosVersion": version,
        })
    }

    fn settings() -> AttributeSet {
        [("Foo", AttributeValue::Integer(123)), ("Bar", "baz".into())]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_get_bios_settings() {
        let fleet = FakeFleet::new().with_node(
            "n1",
            FakeBmc::default().get(
                BIOS_PATH,
                200,
                json!({"Id": "Bios", "Attributes": {"BootMode": "UEFI", "Numa": 2}}),
            ),
        );
        let attrs = get_bios_settings(&fleet, "n1", &credential()).unwrap();
        assert_eq!(attrs.get("BootMode"), Some(&AttributeValue::from("UEFI")));
        assert_eq!(attrs.get("Numa"), Some(&AttributeValue::Integer(2)));
        assert_eq!(fleet.logouts("n1"), 1);
    }

    #[test]
    fn test_get_bios_settings_error_still_logs_out() {
        let fleet = FakeFleet::new().with_node(
            "n1",
            FakeBmc::default().get(BIOS_PATH, 500, json!({"error": "busy"})),
        );
        let result = get_bios_settings(&fleet, "n1", &credential());
        assert!(matches!(result, Err(RedfishError::RedfishStatusError { .. })));
        assert_eq!(fleet.logouts("n1"), 1);
    }

    #[test]
    fn test_get_bios_versions_isolates_failures() {
        let fleet = FakeFleet::new()
            .with_node("n1", FakeBmc::default().get(SYSTEM_PATH, 200, system("1.0")))
            .with_node("n2", FakeBmc::default().login_status(401))
            .with_node("n3", FakeBmc::default().get(SYSTEM_PATH, 404, json!({})))
            .with_node("n4", FakeBmc::default().get(SYSTEM_PATH, 200, system("1.1")));
        // n5 is unknown to the fake, so unreachable
        let nodes = nodes(&["n1", "n2", "n3", "n4", "n5"]);
        let results = get_bios_versions(&fleet, &nodes, &credential());

        assert_eq!(results.len(), 5);
        assert_eq!(results.get("n1").unwrap().as_ref().unwrap(), "1.0");
        assert!(matches!(results.get("n2"), Some(Err(RedfishError::AuthError { .. }))));
        assert!(matches!(
            results.get("n3"),
            Some(Err(RedfishError::RedfishStatusError { .. }))
        ));
        assert_eq!(results.get("n4").unwrap().as_ref().unwrap(), "1.1");
        assert!(matches!(
            results.get("n5"),
            Some(Err(RedfishError::ConnectionError { .. }))
        ));

        // every session that was opened got closed, none for failed logins
        assert_eq!(fleet.logouts("n1"), 1);
        assert_eq!(fleet.logouts("n2"), 0);
        assert_eq!(fleet.logouts("n3"), 1);
        assert_eq!(fleet.logouts("n4"), 1);
        assert_eq!(fleet.logouts("n5"), 0);
    }

    #[test]
    fn test_session_closed_before_next_node() {
        let fleet = FakeFleet::new()
            .with_node("n1", FakeBmc::default().get(SYSTEM_PATH, 200, system("1.0")))
            .with_node("n2", FakeBmc::default().get(SYSTEM_PATH, 200, system("1.0")));
        get_bios_versions(&fleet, &nodes(&["n1", "n2"]), &credential());
        let calls = fleet.calls();
        let logout_n1 = calls
            .iter()
            .position(|c| c == &Call::Logout("n1".to_string()))
            .unwrap();
        let login_n2 = calls
            .iter()
            .position(|c| c == &Call::Login("n2".to_string()))
            .unwrap();
        assert!(logout_n1 < login_n2);
    }

    #[test]
    fn test_set_bios_settings_patches_every_node() {
        let fleet = FakeFleet::new()
            .with_node("n1", FakeBmc::default())
            .with_node("n2", FakeBmc::default());
        set_bios_settings(&fleet, &nodes(&["n1", "n2"]), &credential(), &settings()).unwrap();

        for node in ["n1", "n2"] {
            assert!(fleet.calls().contains(&Call::Patch {
                node: node.to_string(),
                api: BIOS_SETTINGS_PATH.to_string(),
                if_match: "*".to_string(),
                body: json!({"Attributes": {"Foo": 123, "Bar": "baz"}}),
            }));
            assert_eq!(fleet.logouts(node), 1);
        }
    }

    #[test]
    fn test_set_bios_settings_fails_fast() {
        let fleet = FakeFleet::new()
            .with_node("n1", FakeBmc::default())
            .with_node("n2", FakeBmc::default())
            .with_node("n3", FakeBmc::default().patch_status(412))
            .with_node("n4", FakeBmc::default())
            .with_node("n5", FakeBmc::default());
        let nodes = nodes(&["n1", "n2", "n3", "n4", "n5"]);
        let result = set_bios_settings(&fleet, &nodes, &credential(), &settings());

        match result {
            Err(RedfishError::RedfishStatusError {
                node, status_code, ..
            }) => {
                assert_eq!(node, "n3");
                assert_eq!(status_code.as_u16(), 412);
            }
            r => panic!("expected n3 to fail, got {r:?}"),
        }
        assert_eq!(fleet.patches("n1"), 1);
        assert_eq!(fleet.patches("n2"), 1);
        assert_eq!(fleet.patches("n3"), 1);
        assert_eq!(fleet.patches("n4"), 0);
        assert_eq!(fleet.patches("n5"), 0);
        assert!(!fleet.calls().contains(&Call::Login("n4".to_string())));
        // the failing node's session is still closed
        assert_eq!(fleet.logouts("n3"), 1);
    }

    #[test]
    fn test_set_bios_settings_twice_succeeds() {
        let fleet = FakeFleet::new().with_node("n1", FakeBmc::default());
        let nodes = nodes(&["n1"]);
        set_bios_settings(&fleet, &nodes, &credential(), &settings()).unwrap();
        set_bios_settings(&fleet, &nodes, &credential(), &settings()).unwrap();
        assert_eq!(fleet.patches("n1"), 2);
    }

    #[test]
    fn test_set_boot_once_uses_etag() {
        let fleet = FakeFleet::new()
            .with_node("n1", FakeBmc::default().get(SYSTEM_PATH, 200, system("1.0")));
        let results = set_boot_once(&fleet, &nodes(&["n1"]), &credential(), BootSource::Pxe);
        assert!(results.is_all_ok());
        assert_eq!(
            fleet.calls(),
            vec![
                Call::Login("n1".to_string()),
                Call::Get {
                    node: "n1".to_string(),
                    api: SYSTEM_PATH.to_string(),
                },
                Call::Patch {
                    node: "n1".to_string(),
                    api: SYSTEM_PATH.to_string(),
                    if_match: "W/\"1.0\"".to_string(),
                    body: json!({
                        "Boot": {
                            "BootSourceOverrideEnabled": "Once",
                            "BootSourceOverrideTarget": "Pxe"
                        }
                    }),
                },
                Call::Logout("n1".to_string()),
            ]
        );
    }

    #[test]
    fn test_set_boot_once_without_etag_does_not_patch() {
        let fleet = FakeFleet::new()
            .with_node(
                "n1",
                FakeBmc::default().get(SYSTEM_PATH, 200, json!({"BiosVersion": "1.0"})),
            )
            .with_node("n2", FakeBmc::default().get(SYSTEM_PATH, 200, system("1.0")));
        let results = set_boot_once(
            &fleet,
            &nodes(&["n1", "n2"]),
            &credential(),
            BootSource::BiosSetup,
        );

        assert!(matches!(
            results.get("n1"),
            Some(Err(RedfishError::MissingField { field, .. })) if field == ETAG_FIELD
        ));
        assert_eq!(fleet.patches("n1"), 0);
        assert_eq!(fleet.logouts("n1"), 1);
        assert!(results.get("n2").unwrap().is_ok());
        assert_eq!(fleet.patches("n2"), 1);
    }

    #[test]
    fn test_set_boot_once_rejects_200_patch() {
        let fleet = FakeFleet::new().with_node(
            "n1",
            FakeBmc::default()
                .get(SYSTEM_PATH, 200, system("1.0"))
                .patch_status(200),
        );
        let results = set_boot_once(&fleet, &nodes(&["n1"]), &credential(), BootSource::Hdd);
        assert!(matches!(
            results.get("n1"),
            Some(Err(RedfishError::RedfishStatusError { .. }))
        ));
    }
}
