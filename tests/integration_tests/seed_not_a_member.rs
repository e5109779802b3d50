// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Scenario 3 (spec §8): the seed reports it isn't really part of the
//! expected replica set; it gets deregistered, but its advertised member
//! list is still ingested.

use std::collections::HashMap;

use docdb_conn_manager::{
    connection::ServerRole,
    manager::{ConnFlags, Manager},
    seed::{DeploymentType, SeedSet},
    transport::{IsMasterOutcome, IsMasterReport},
};

use crate::integration_tests::support::{MockTransport, ServerScript, test_server};

#[tokio::test]
async fn not_a_member_seed_is_deregistered_but_members_still_ingested() {
    let transport = MockTransport::new();

    transport.script(
        "x.example.com",
        27017,
        ServerScript::reachable().with_ismaster(IsMasterOutcome::OkButNotAMember(IsMasterReport {
            role: ServerRole::Standalone,
            replica_set_name: None,
            hosts: vec![
                "a.example.com:27017".to_string(),
                "b.example.com:27017".to_string(),
                "c.example.com:27017".to_string(),
            ],
            tags: HashMap::new(),
            latency_us: 4_000,
        })),
    );
    for (host, role, latency) in [
        ("a.example.com", ServerRole::Primary, 5_000),
        ("b.example.com", ServerRole::Secondary, 6_000),
        ("c.example.com", ServerRole::Secondary, 7_000),
    ] {
        transport.script(
            host,
            27017,
            ServerScript::reachable().with_ismaster(IsMasterOutcome::Ok(IsMasterReport {
                role,
                replica_set_name: None,
                hosts: Vec::new(),
                tags: HashMap::new(),
                latency_us: latency,
            })),
        );
    }

    let manager = Manager::init(transport);
    let mut seeds = SeedSet::new(vec![test_server("x.example.com", 27017)], DeploymentType::ReplicaSet);

    let conn = manager
        .get_read_write_connection(&mut seeds, ConnFlags::empty())
        .await
        .expect("call should succeed")
        .expect("a connection should be returned");

    assert_eq!(manager.registered_count(), 3, "X should be evicted, A/B/C acquired");
    assert_ne!(conn.hash, docdb_conn_manager::identity::identity(&test_server("x.example.com", 27017)));
}
