// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Scenario 2 (spec §8): replica set discovery anchors the expected set
//! name on the first successful probe and pulls in every advertised member.

use std::collections::HashMap;

use docdb_conn_manager::{
    connection::ServerRole,
    manager::{ConnFlags, Manager},
    seed::{DeploymentType, SeedSet},
    transport::{IsMasterOutcome, IsMasterReport},
};

use crate::integration_tests::support::{MockTransport, ServerScript, test_server};

#[tokio::test]
async fn discovers_full_member_set_and_returns_primary() {
    let transport = MockTransport::new();

    transport.script(
        "a.example.com",
        27017,
        ServerScript::reachable().with_ismaster(IsMasterOutcome::Ok(IsMasterReport {
            role: ServerRole::Primary,
            replica_set_name: Some("rs0".to_string()),
            hosts: vec![
                "a.example.com:27017".to_string(),
                "b.example.com:27017".to_string(),
                "c.example.com:27017".to_string(),
            ],
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
            latency_us: 8_000,
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
            latency_us: 9_000,
        })),
    );

    let manager = Manager::init(transport);
    let mut seeds = SeedSet::new(vec![test_server("a.example.com", 27017)], DeploymentType::ReplicaSet);
    seeds.expected_replica_set = Some("rs0".to_string());

    let conn = manager
        .get_read_write_connection(&mut seeds, ConnFlags::WRITE)
        .await
        .expect("call should succeed")
        .expect("a connection should be returned");

    assert_eq!(manager.registered_count(), 3);
    assert_eq!(conn.hash, docdb_conn_manager::identity::identity(&test_server("a.example.com", 27017)));
    assert_eq!(conn.role().await, ServerRole::Primary);
    assert_eq!(seeds.servers.len(), 3);
}
