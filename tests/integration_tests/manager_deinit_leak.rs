// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Round-trip/idempotence law (spec §8): `manager_deinit` after any sequence
//! of operations leaks no `Connection`, verified with a mock transport that
//! counts dial/ping calls.

use docdb_conn_manager::{
    manager::{ConnFlags, Manager},
    seed::{DeploymentType, SeedSet},
};

use crate::integration_tests::support::{MockTransport, ServerScript, test_server};

#[tokio::test]
async fn deinit_drops_every_registered_connection() {
    let transport = MockTransport::new();
    transport.script("a.example.com", 27017, ServerScript::reachable());
    transport.script("b.example.com", 27017, ServerScript::reachable());

    let manager = Manager::init(transport);
    let mut seeds = SeedSet::new(
        vec![test_server("a.example.com", 27017), test_server("b.example.com", 27017)],
        DeploymentType::MultiRouter,
    );

    manager
        .get_read_write_connection(&mut seeds, ConnFlags::empty())
        .await
        .expect("call should succeed");

    assert_eq!(manager.registered_count(), 2);

    manager.deinit();

    assert_eq!(manager.registered_count(), 0, "deinit must leave no connection registered");

    // Calling it again on an already-empty registry must not panic or error.
    manager.deinit();
    assert_eq!(manager.registered_count(), 0);
}

#[tokio::test]
async fn reacquiring_after_deinit_does_not_reuse_stale_state() {
    let transport = MockTransport::new();
    transport.script("a.example.com", 27017, ServerScript::reachable());

    let manager = Manager::init(transport);
    let mut seeds = SeedSet::new(vec![test_server("a.example.com", 27017)], DeploymentType::Standalone);

    manager
        .get_read_write_connection(&mut seeds, ConnFlags::empty())
        .await
        .expect("call should succeed");
    assert_eq!(manager.registered_count(), 1);

    manager.deinit();
    assert_eq!(manager.registered_count(), 0);

    let conn = manager
        .get_read_write_connection(&mut seeds, ConnFlags::empty())
        .await
        .expect("call should succeed")
        .expect("a fresh connection should be dialed again");
    assert_eq!(manager.registered_count(), 1);
    assert_eq!(conn.hash, docdb_conn_manager::identity::identity(&test_server("a.example.com", 27017)));
}
