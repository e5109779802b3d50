// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Topology Discoverer (spec §4.4): runs only for `DeploymentType::ReplicaSet`,
//! iteratively probing known servers with `ismaster` and growing the working
//! seed set until fixpoint.

use std::collections::{HashSet, VecDeque};

use crate::{
    acquirer,
    identity::identity,
    manager::{LogLevel, LogSink, Module},
    registry::Registry,
    seed::ServerDef,
    transport::{IsMasterOutcome, Transport},
};

/// Runs topology discovery over `seeds`, mutating it in place and populating
/// `registry` as new members are discovered (spec §4.4).
///
/// Uses an explicit worklist + visited-set rather than mutating `seeds`
/// while iterating it by index, per the Design Notes on cyclic discovery
/// state; entries still drain in enqueue order, so the first successful
/// `ismaster` anchors `expected_replica_set` exactly as a naive
/// iterate-by-index implementation would.
pub async fn discover_topology<T: Transport>(
    registry: &Registry<T::Handle>,
    transport: &T,
    seeds: &mut Vec<ServerDef>,
    expected_replica_set: &mut Option<String>,
    log: &dyn LogSink,
) {
    let mut worklist: VecDeque<ServerDef> = seeds.iter().cloned().collect();
    let mut visited: HashSet<String> = seeds.iter().map(identity).collect();

    while let Some(server) = worklist.pop_front() {
        let hash = identity(&server);
        let endpoint = server.display_endpoint();

        let Some(conn) = registry.find(&hash) else {
            log.log(
                Module::Discovery,
                LogLevel::Warn,
                &format!("no cached connection for {endpoint}, this seed was never dialed, skipping"),
            );
            continue;
        };

        let outcome = transport.ismaster(&conn.handle, expected_replica_set, &server).await;

        let report = match outcome {
            IsMasterOutcome::ProtocolError(message) => {
                log.log(
                    Module::Discovery,
                    LogLevel::Warn,
                    &format!("ismaster failed for {endpoint}: {message}, deregistering"),
                );
                registry.deregister(&hash);
                continue;
            },
            IsMasterOutcome::Throttled => {
                log.log(Module::Discovery, LogLevel::Fine, &format!("ismaster throttled for {endpoint}"));
                continue;
            },
            IsMasterOutcome::Ok(report) => {
                log.log(
                    Module::Discovery,
                    LogLevel::Fine,
                    &format!("ismaster ok for {endpoint}: role={:?}", report.role),
                );
                conn.record_ismaster(
                    report.role,
                    report.replica_set_name.clone(),
                    report.tags.clone(),
                    report.latency_us,
                )
                .await;
                report
            },
            IsMasterOutcome::OkButNotAMember(report) => {
                log.log(
                    Module::Discovery,
                    LogLevel::Info,
                    &format!("{endpoint} reports it is not a member of the expected set, deregistering"),
                );
                registry.deregister(&hash);
                report
            },
        };

        for member in &report.hosts {
            let Some((host, port)) = split_host_port(member) else {
                continue;
            };
            let member_def = server.with_host_port(host, port);
            let member_hash = identity(&member_def);

            if visited.contains(&member_hash) {
                continue;
            }

            // Unconditional WRITE on discovery (spec §4.4 step 3, §9 "Write
            // flag coupling"): acquisition itself has no write-specific
            // behavior, so this only matters once the selector runs.
            match acquirer::acquire(registry, transport, &member_def, false).await {
                Ok(_) => {
                    visited.insert(member_hash);
                    seeds.push(member_def.clone());
                    worklist.push_back(member_def);
                },
                Err(e) => {
                    log.log(
                        Module::Discovery,
                        LogLevel::Warn,
                        &format!("failed to acquire discovered member {}: {e}", member_def.display_endpoint()),
                    );
                },
            }
        }
    }
}

fn split_host_port(hostport: &str) -> Option<(String, u16)> {
    let (host, port) = hostport.rsplit_once(':')?;
    let port: u16 = port.parse().ok()?;
    Some((host.to_string(), port))
}
