// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Connection Registry (spec §4.2): owned by the Manager, maps identity hash
//! to live `Connection`.

use std::sync::Arc;

use dashmap::DashMap;

use crate::connection::Connection;

/// A mapping from identity hash to live `Connection`, exclusively owned by
/// the `Manager`.
///
/// Backed by `DashMap` so that acquisitions for distinct endpoints proceed
/// without contending on a single lock (spec §5), while `register`'s
/// entry-based insert still gives the "at most one Connection per hash"
/// double-checked-insertion guarantee for a single endpoint.
#[derive(Debug, Default)]
pub struct Registry<H> {
    connections: DashMap<String, Arc<Connection<H>>>,
}

impl<H> Registry<H> {
    /// Builds an empty registry.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Linear (conceptually — `DashMap`'s sharded lookup is effectively
    /// O(1) here, but the contract is "unique match or none") lookup by
    /// identity hash.
    pub fn find(&self, hash: &str) -> Option<Arc<Connection<H>>> {
        self.connections.get(hash).map(|entry| Arc::clone(entry.value()))
    }

    /// Registers `conn`. Precondition: `find(conn.hash)` is `None`.
    ///
    /// In debug builds, registering a hash that's already present is a
    /// programming error and trips a debug assertion; in release builds the
    /// existing entry is silently kept and the call is a no-op (the
    /// precondition violation is undefined-but-harmless, per spec §4.2).
    pub fn register(&self, conn: Arc<Connection<H>>) {
        let hash = conn.hash.clone();
        let prior = self.connections.insert(hash.clone(), conn);
        debug_assert!(
            prior.is_none(),
            "Registry::register called with an already-registered hash {hash}"
        );
    }

    /// Removes the entry for `hash`, destroying the owned `Connection`.
    /// Returns whether a removal occurred.
    pub fn deregister(&self, hash: &str) -> bool {
        self.connections.remove(hash).is_some()
    }

    /// Destroys every `Connection` and empties the registry. Iterative by
    /// construction (`DashMap::clear` does not recurse), per the spec's
    /// Design Note that the original's linked-list tail recursion must not
    /// survive translation.
    pub fn destroy_all(&self) {
        self.connections.clear();
    }

    /// Number of currently registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the registry currently holds no connections.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Snapshot of every registered connection, for the selector pipeline.
    pub fn all(&self) -> Vec<Arc<Connection<H>>> {
        self.connections.iter().map(|entry| Arc::clone(entry.value())).collect()
    }
}
