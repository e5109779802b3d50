// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Scenario 4 (spec §8): `Nearest` read preference restricts candidates to
//! those within `window_ms` of the minimum observed latency.

use std::collections::HashMap;

use docdb_conn_manager::{
    connection::ServerRole,
    manager::{ConnFlags, Manager},
    read_preference::{ReadPrefMode, ReadPreference},
    seed::{DeploymentType, SeedSet},
    transport::{IsMasterOutcome, IsMasterReport},
};

use crate::integration_tests::support::{MockTransport, ServerScript, test_server};

#[tokio::test]
async fn nearest_keeps_only_candidates_within_the_window() {
    let transport = MockTransport::new();

    transport.script(
        "a.example.com",
        27017,
        ServerScript::reachable().with_ismaster(IsMasterOutcome::Ok(IsMasterReport {
            role: ServerRole::Primary,
            replica_set_name: Some("rs0".to_string()),
            hosts: Vec::new(),
            tags: HashMap::new(),
            latency_us: 5_000,
        })),
    );
    transport.script(
        "b.example.com",
        27017,
        ServerScript::reachable().with_ismaster(IsMasterOutcome::Ok(IsMasterReport {
            role: ServerRole::Secondary,
            replica_set_name: Some("rs0".to_string()),
            hosts: Vec::new(),
            tags: HashMap::new(),
            latency_us: 12_000,
        })),
    );
    transport.script(
        "c.example.com",
        27017,
        ServerScript::reachable().with_ismaster(IsMasterOutcome::Ok(IsMasterReport {
            role: ServerRole::Secondary,
            replica_set_name: Some("rs0".to_string()),
            hosts: Vec::new(),
            tags: HashMap::new(),
            latency_us: 40_000,
        })),
    );

    let manager = Manager::init(transport);
    let mut seeds = SeedSet::new(
        vec![
            test_server("a.example.com", 27017),
            test_server("b.example.com", 27017),
            test_server("c.example.com", 27017),
        ],
        DeploymentType::ReplicaSet,
    );
    seeds.read_preference = ReadPreference {
        mode: ReadPrefMode::Nearest,
        tag_sets: Vec::new(),
        window_ms: 15,
    };

    let conn = manager
        .get_read_write_connection(&mut seeds, ConnFlags::empty())
        .await
        .expect("call should succeed")
        .expect("a connection should be returned");

    let a_hash = docdb_conn_manager::identity::identity(&test_server("a.example.com", 27017));
    let b_hash = docdb_conn_manager::identity::identity(&test_server("b.example.com", 27017));
    assert!(
        conn.hash == a_hash || conn.hash == b_hash,
        "c.example.com (40ms) is outside the 15ms window and must not be picked"
    );
}
