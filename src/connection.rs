// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The live, authenticated `Connection` and its classification (spec §3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// How the cluster classified a server, as of the last successful
/// `ismaster` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerRole {
    /// No successful `ismaster` reply has been observed yet.
    #[default]
    Unknown,
    /// The replica-set primary.
    Primary,
    /// A replica-set secondary.
    Secondary,
    /// A replica-set arbiter (votes but holds no data).
    Arbiter,
    /// A sharded-cluster query router.
    Mongos,
    /// A standalone (unreplicated) server.
    Standalone,
}

/// The subset of `Connection` state that changes after construction: role,
/// latency, tags, timestamps. Guarded by a single lock so a concurrent ping
/// and an in-flight `ismaster` can't interleave their writes.
#[derive(Debug, Default)]
struct Mutable {
    last_ping_ts: Option<DateTime<Utc>>,
    last_ismaster_ts: Option<DateTime<Utc>>,
    latency_us: u64,
    role: ServerRole,
    replica_set_name: Option<String>,
    tags: HashMap<String, String>,
}

/// A live, authenticated session bound to one `ServerDef` (spec §3).
///
/// `handle` is whatever socket/session handle the `Transport` collaborator
/// returned from `dial`; the manager never interprets it, only holds it for
/// the lifetime of the registration.
#[derive(Debug)]
pub struct Connection<H> {
    /// Immutable once registered — the canonical pool key (spec §4.1).
    pub hash: String,
    /// The transport-level handle (socket, session, whatever the
    /// `Transport` collaborator produced).
    pub handle: H,
    /// Hashed `(user, password)` pair, or `None` if this connection was
    /// never authenticated. Used by the selector's candidate filter.
    pub auth_scope: Option<String>,
    mutable: Mutex<Mutable>,
}

impl<H> Connection<H> {
    /// Wraps a freshly dialed (and possibly authenticated) handle.
    pub fn new(hash: String, handle: H, auth_scope: Option<String>) -> Self {
        Self {
            hash,
            handle,
            auth_scope,
            mutable: Mutex::new(Mutable::default()),
        }
    }

    /// Records the outcome of a successful `ping` (spec §6: "also updates
    /// `last_ping_ts` and `latency_us`").
    pub async fn record_ping(&self, latency_us: u64) {
        let mut m = self.mutable.lock().await;
        m.last_ping_ts = Some(Utc::now());
        m.latency_us = latency_us;
    }

    /// Records the outcome of a successful `ismaster` (spec §6: "also
    /// updates `role`, `tags`, `latency_us`, and `last_ismaster_ts`").
    pub async fn record_ismaster(
        &self,
        role: ServerRole,
        replica_set_name: Option<String>,
        tags: HashMap<String, String>,
        latency_us: u64,
    ) {
        let mut m = self.mutable.lock().await;
        m.last_ismaster_ts = Some(Utc::now());
        m.role = role;
        m.replica_set_name = replica_set_name;
        m.tags = tags;
        m.latency_us = latency_us;
    }

    /// Current classification, as of the last successful `ismaster`.
    pub async fn role(&self) -> ServerRole {
        self.mutable.lock().await.role
    }

    /// Measured round-trip latency in microseconds.
    pub async fn latency_us(&self) -> u64 {
        self.mutable.lock().await.latency_us
    }

    /// Current tag set.
    pub async fn tags(&self) -> HashMap<String, String> {
        self.mutable.lock().await.tags.clone()
    }

    /// Replica-set name last reported by this connection, if any.
    pub async fn replica_set_name(&self) -> Option<String> {
        self.mutable.lock().await.replica_set_name.clone()
    }

    /// Snapshot of every field the selector cares about, taken under one
    /// lock acquisition so the filter/sort/window stages all see a
    /// consistent view (spec §5: "the selector observes a snapshot of the
    /// registry").
    pub async fn snapshot(&self) -> ConnectionSnapshot {
        let m = self.mutable.lock().await;
        ConnectionSnapshot {
            hash: self.hash.clone(),
            auth_scope: self.auth_scope.clone(),
            role: m.role,
            latency_us: m.latency_us,
            tags: m.tags.clone(),
        }
    }
}

/// An immutable point-in-time view of a `Connection`, used by the selector
/// so it can filter/sort/window without holding the per-connection lock.
#[derive(Debug, Clone)]
pub struct ConnectionSnapshot {
    /// The connection's identity hash.
    pub hash: String,
    /// Hashed auth scope, or `None` if unauthenticated.
    pub auth_scope: Option<String>,
    /// Role as of the last successful `ismaster`.
    pub role: ServerRole,
    /// Measured round-trip latency in microseconds.
    pub latency_us: u64,
    /// Tag set as of the last successful `ismaster`.
    pub tags: HashMap<String, String>,
}
