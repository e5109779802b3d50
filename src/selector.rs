// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Selector Pipeline (spec §4.5): candidate filter -> sort-by-latency ->
//! nearest-window restriction -> pick, plus the two deployment-type dispatch
//! routines that drive acquisition and (for replica sets) discovery first.

use rand::Rng as _;

use crate::{
    acquirer,
    connection::{Connection, ConnectionSnapshot, ServerRole},
    discovery::discover_topology,
    error::ManagerError,
    manager::{LogLevel, LogSink, Module},
    read_preference::{ReadPrefMode, ReadPreference, matches_any},
    registry::Registry,
    seed::SeedSet,
    transport::{Transport, hashed_password},
};

/// Stage 1: the candidate filter (spec §4.5 step 1).
///
/// `accept_unclassified` widens the `Nearest` arm to also accept
/// `Standalone`/`Mongos`/`Unknown` roles. The `Standalone`/`MultiRouter`
/// dispatch path (`get_connection_multiple`) never runs `ismaster`, so its
/// connections are never reclassified out of `Unknown` (or, for a real
/// standalone/mongos node, would report `Standalone`/`Mongos` if this crate
/// ever grew classification there) — without this, the forced-`Nearest`
/// selection pass used by that path would always see an empty candidate set.
/// The replica-set path passes `false`: its nodes are always classified by
/// topology discovery before selection runs, and "primaries or secondaries"
/// is the literal spec rule there.
fn candidates(
    snapshots: &[ConnectionSnapshot],
    read_pref: &ReadPreference,
    auth_scope: Option<&str>,
    accept_unclassified: bool,
) -> Vec<ConnectionSnapshot> {
    let has_primary = snapshots.iter().any(|c| c.role == ServerRole::Primary);
    let has_secondary = snapshots.iter().any(|c| c.role == ServerRole::Secondary);

    snapshots
        .iter()
        .filter(|c| c.auth_scope.as_deref() == auth_scope)
        .filter(|c| match read_pref.mode {
            ReadPrefMode::Primary => c.role == ServerRole::Primary,
            ReadPrefMode::Secondary => c.role == ServerRole::Secondary,
            ReadPrefMode::PrimaryPreferred => {
                if has_primary {
                    c.role == ServerRole::Primary
                } else {
                    c.role == ServerRole::Secondary
                }
            },
            ReadPrefMode::SecondaryPreferred => {
                if has_secondary {
                    c.role == ServerRole::Secondary
                } else {
                    c.role == ServerRole::Primary
                }
            },
            ReadPrefMode::Nearest => {
                c.role == ServerRole::Primary
                    || c.role == ServerRole::Secondary
                    || (accept_unclassified && matches!(c.role, ServerRole::Standalone | ServerRole::Mongos | ServerRole::Unknown))
            },
        })
        .filter(|c| {
            matches!(read_pref.mode, ReadPrefMode::Primary | ReadPrefMode::PrimaryPreferred)
                || matches_any(&read_pref.tag_sets, &c.tags)
        })
        .cloned()
        .collect()
}

/// Stages 2-4: sort by latency, restrict to the nearest window, pick one.
fn select(mut candidates: Vec<ConnectionSnapshot>, read_pref: &ReadPreference) -> Option<ConnectionSnapshot> {
    if candidates.is_empty() {
        return None;
    }

    candidates.sort_by_key(|c| c.latency_us);

    let min_latency = candidates[0].latency_us;
    let window = u64::from(read_pref.window_ms) * 1000;
    candidates.retain(|c| c.latency_us <= min_latency.saturating_add(window));

    if read_pref.mode == ReadPrefMode::Primary {
        return candidates.into_iter().find(|c| c.role == ServerRole::Primary);
    }

    let idx = rand::rng().random_range(0..candidates.len());
    Some(candidates.swap_remove(idx))
}

/// `get_connection_multiple` (spec §4.5): used by `Standalone`/`MultiRouter`
/// deployments. Acquires every seed (collecting failures into one message),
/// then runs the selector with the read preference forced to `Nearest`.
pub async fn get_connection_multiple<T: Transport>(
    registry: &Registry<T::Handle>,
    transport: &T,
    seeds: &SeedSet,
    dont_connect: bool,
    log: &dyn LogSink,
) -> Result<Option<std::sync::Arc<Connection<T::Handle>>>, ManagerError> {
    let mut errors = Vec::new();
    let mut found_connected_server = false;

    for server in &seeds.servers {
        match acquirer::acquire(registry, transport, server, dont_connect).await {
            Ok(Some(_)) => found_connected_server = true,
            Ok(None) => {},
            Err(e) => {
                log.log(
                    Module::Selector,
                    LogLevel::Warn,
                    &format!("failed to acquire {}: {e}", server.display_endpoint()),
                );
                errors.push(e.to_string());
            },
        }
    }

    if !found_connected_server && dont_connect {
        // Open question #1 (DESIGN.md): no dials were attempted, so there is
        // nothing to report.
        return Ok(None);
    }

    let forced = seeds.read_preference.forced_nearest();
    let auth_scope = auth_scope_for(seeds);

    let mut snapshots = Vec::with_capacity(registry.len());
    for conn in registry.all() {
        snapshots.push(conn.snapshot().await);
    }

    // `accept_unclassified = true`: this path never runs `ismaster`, so its
    // connections stay `ServerRole::Unknown` forever (see the doc comment on
    // `candidates`).
    let picked = select(candidates(&snapshots, &forced, auth_scope.as_deref(), true), &forced);
    match picked {
        Some(snapshot) => Ok(registry.find(&snapshot.hash)),
        None if errors.is_empty() => Err(ManagerError::NoCandidateServers("No candidate servers found".to_string())),
        None => Err(ManagerError::NoCandidateServers(errors.join("; "))),
    }
}

/// `get_read_write_connection_replicaset` (spec §4.5): acquires every seed,
/// runs topology discovery, then runs the selector. If the caller requested
/// `WRITE`, the read preference is forced to `Primary` for the selection
/// pass only.
pub async fn get_read_write_connection_replicaset<T: Transport>(
    registry: &Registry<T::Handle>,
    transport: &T,
    seeds: &mut SeedSet,
    want_write: bool,
    dont_connect: bool,
    log: &dyn LogSink,
) -> Result<std::sync::Arc<Connection<T::Handle>>, ManagerError> {
    for server in seeds.servers.clone() {
        if let Err(e) = acquirer::acquire(registry, transport, &server, dont_connect).await {
            log.log(
                Module::Selector,
                LogLevel::Warn,
                &format!("failed to acquire seed {}: {e}", server.display_endpoint()),
            );
        }
    }

    if !dont_connect {
        discover_topology(
            registry,
            transport,
            &mut seeds.servers,
            &mut seeds.expected_replica_set,
            log,
        )
        .await;
    }

    let effective = if want_write {
        seeds.read_preference.forced_primary()
    } else {
        seeds.read_preference.clone()
    };
    let auth_scope = auth_scope_for(seeds);

    let mut snapshots = Vec::with_capacity(registry.len());
    for conn in registry.all() {
        snapshots.push(conn.snapshot().await);
    }

    // `accept_unclassified = false`: replica-set nodes are always classified
    // by topology discovery before selection runs here.
    let picked = select(candidates(&snapshots, &effective, auth_scope.as_deref(), false), &effective);
    match picked.and_then(|snapshot| registry.find(&snapshot.hash)) {
        Some(conn) => Ok(conn),
        None => Err(ManagerError::NoCandidateServers("No candidate servers found".to_string())),
    }
}

fn auth_scope_for(seeds: &SeedSet) -> Option<String> {
    let server = seeds.servers.first()?;
    server
        .has_auth()
        .then(|| hashed_password(server.username.as_deref().unwrap_or_default(), server.password.as_deref().unwrap_or_default()))
}
