// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Ambient configuration layer (spec §10.1): pure plumbing for
//! *constructing* a [`crate::manager::Manager`]/[`crate::seed::SeedSet`]/
//! [`crate::read_preference::ReadPreference`] from a YAML file. Never
//! consulted by `src/selector.rs` or `src/discovery.rs` decision logic.

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::read_preference::ReadPreference;

/// Runtime tuning knobs for a [`crate::manager::Manager`], loadable from
/// YAML the same way the teacher loads `Config::load_from_file`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ManagerConfig {
    /// Seconds between reuse-time liveness pings before a cached connection
    /// is considered due for a fresh probe.
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u32,
    /// Seconds between `ismaster` probes during topology discovery.
    #[serde(default = "default_ismaster_interval_secs")]
    pub ismaster_interval_secs: u32,
    /// Read preference applied when a caller's `SeedSet` doesn't carry one
    /// of its own.
    #[serde(default)]
    pub default_read_preference: ReadPreference,
    /// Soft upper bound on the number of connections the registry is
    /// expected to hold; purely advisory (the registry itself has no hard
    /// cap) but surfaced so a demo/caller can size its seed lists sanely.
    #[serde(default = "default_pool_capacity_hint")]
    pub pool_capacity_hint: u32,
}

fn default_ping_interval_secs() -> u32 {
    10
}

fn default_ismaster_interval_secs() -> u32 {
    10
}

fn default_pool_capacity_hint() -> u32 {
    12
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval_secs(),
            ismaster_interval_secs: default_ismaster_interval_secs(),
            default_read_preference: ReadPreference::default(),
            pool_capacity_hint: default_pool_capacity_hint(),
        }
    }
}

impl ManagerConfig {
    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let mut cfg: ManagerConfig =
            serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    /// Rejects zero intervals and clamps the latency window to a sane floor.
    /// Ambient input validation, not a new core feature.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(self.ping_interval_secs >= 1, "ping_interval_secs must be >= 1");
        ensure!(
            self.ismaster_interval_secs >= 1,
            "ismaster_interval_secs must be >= 1"
        );
        ensure!(self.pool_capacity_hint >= 1, "pool_capacity_hint must be >= 1");

        const MIN_WINDOW_MS: u32 = 1;
        if self.default_read_preference.window_ms < MIN_WINDOW_MS {
            self.default_read_preference.window_ms = MIN_WINDOW_MS;
        }

        Ok(())
    }
}
