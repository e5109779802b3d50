// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Target endpoint descriptors and the working seed set (spec §3).

use serde::{Deserialize, Serialize};

use crate::read_preference::ReadPreference;

/// A target endpoint descriptor.
///
/// Created during URI parsing (by the caller) or topology discovery;
/// destroyed only when the owning `SeedSet` is discarded. Contains no live
/// resources of its own — see `Connection` for the live session bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDef {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Database to authenticate against, if auth is configured.
    #[serde(default)]
    pub auth_db: Option<String>,
    /// Username to authenticate with, if auth is configured.
    #[serde(default)]
    pub username: Option<String>,
    /// Password to authenticate with, if auth is configured.
    #[serde(default)]
    pub password: Option<String>,
}

impl ServerDef {
    /// Builds a bare, unauthenticated `ServerDef`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            auth_db: None,
            username: None,
            password: None,
        }
    }

    /// Returns whether all three auth fields are present (spec §4.3 step 4b).
    pub fn has_auth(&self) -> bool {
        self.auth_db.is_some() && self.username.is_some() && self.password.is_some()
    }

    /// Clones this definition's auth scope onto a freshly discovered host.
    ///
    /// Used by the topology discoverer (spec §4.4 step 3): a member
    /// discovered via `ismaster` inherits the seed's credentials, not a
    /// blank slate.
    pub fn with_host_port(&self, host: String, port: u16) -> Self {
        Self {
            host,
            port,
            auth_db: self.auth_db.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// Renders this endpoint as `host:port`, for error messages and logging.
    pub fn display_endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The deployment topology hint carried by a `SeedSet` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentType {
    /// A single, unreplicated server.
    Standalone,
    /// A replica set with one primary and zero or more secondaries.
    ReplicaSet,
    /// A pool of independent routers (e.g. a sharded cluster's query
    /// routers), each treated as interchangeable from the client's
    /// perspective.
    MultiRouter,
}

/// The mutable working set of endpoints a call operates over.
///
/// The topology discoverer appends to `servers` during a replica-set
/// discovery run (spec §4.4); callers should treat the vector as an input
/// they're lending to the call, not a value to keep reusing across calls
/// without re-seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSet {
    /// The working list of endpoints. Grows during topology discovery.
    pub servers: Vec<ServerDef>,
    /// How to interpret and dispatch this seed set.
    pub deployment_type: DeploymentType,
    /// The read preference to apply at selection time.
    pub read_preference: ReadPreference,
    /// The replica-set name the caller expects, if any. `ismaster` both
    /// reads and (on the first successful probe) anchors this.
    #[serde(default)]
    pub expected_replica_set: Option<String>,
}

impl SeedSet {
    /// Builds a seed set with a default (`Primary`, no tags, 15ms window)
    /// read preference.
    pub fn new(servers: Vec<ServerDef>, deployment_type: DeploymentType) -> Self {
        Self {
            servers,
            deployment_type,
            read_preference: ReadPreference::default(),
            expected_replica_set: None,
        }
    }
}
