// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Scenario 5 (spec §8): `SecondaryPreferred` with a tag predicate only
//! considers the primary when no tag-matching secondary exists.

use std::collections::HashMap;

use docdb_conn_manager::{
    connection::ServerRole,
    manager::{ConnFlags, Manager},
    read_preference::{ReadPrefMode, ReadPreference},
    seed::{DeploymentType, SeedSet},
    transport::{IsMasterOutcome, IsMasterReport},
};

use crate::integration_tests::support::{MockTransport, ServerScript, test_server};

fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[tokio::test]
async fn secondary_preferred_honors_tag_match_over_primary() {
    let transport = MockTransport::new();

    transport.script(
        "s1.example.com",
        27017,
        ServerScript::reachable().with_ismaster(IsMasterOutcome::Ok(IsMasterReport {
            role: ServerRole::Secondary,
            replica_set_name: Some("rs0".to_string()),
            hosts: Vec::new(),
            tags: tags(&[("dc", "east")]),
            latency_us: 1_000,
        })),
    );
    transport.script(
        "s2.example.com",
        27017,
        ServerScript::reachable().with_ismaster(IsMasterOutcome::Ok(IsMasterReport {
            role: ServerRole::Secondary,
            replica_set_name: Some("rs0".to_string()),
            hosts: Vec::new(),
            tags: tags(&[("dc", "west")]),
            latency_us: 1_000,
        })),
    );
    transport.script(
        "p.example.com",
        27017,
        ServerScript::reachable().with_ismaster(IsMasterOutcome::Ok(IsMasterReport {
            role: ServerRole::Primary,
            replica_set_name: Some("rs0".to_string()),
            hosts: Vec::new(),
            tags: tags(&[("dc", "east")]),
            latency_us: 1_000,
        })),
    );

    let manager = Manager::init(transport);
    let mut seeds = SeedSet::new(
        vec![
            test_server("s1.example.com", 27017),
            test_server("s2.example.com", 27017),
            test_server("p.example.com", 27017),
        ],
        DeploymentType::ReplicaSet,
    );
    seeds.read_preference = ReadPreference {
        mode: ReadPrefMode::SecondaryPreferred,
        tag_sets: vec![tags(&[("dc", "east")])],
        window_ms: 15,
    };

    let conn = manager
        .get_read_write_connection(&mut seeds, ConnFlags::empty())
        .await
        .expect("call should succeed")
        .expect("a connection should be returned");

    assert_eq!(
        conn.hash,
        docdb_conn_manager::identity::identity(&test_server("s1.example.com", 27017))
    );
}
