// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Read preference policy: mode, tag predicates, latency window (spec §3).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default latency acceptance window, in milliseconds (spec §3).
pub const DEFAULT_WINDOW_MS: u32 = 15;

/// Which role(s) a read preference is willing to read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPrefMode {
    /// Only the primary.
    Primary,
    /// The primary if present, otherwise a secondary.
    PrimaryPreferred,
    /// Only a secondary.
    Secondary,
    /// A secondary if present, otherwise the primary.
    SecondaryPreferred,
    /// Whichever of primary/secondary is closest.
    Nearest,
}

/// A single tag-predicate set: satisfied when every `(key, value)` pair is
/// present on a candidate connection's tag set (spec §4.5 step 1).
pub type TagPredicate = HashMap<String, String>;

/// `(mode, tag predicates, latency window)` — the policy governing §4.5's
/// selector pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadPreference {
    /// Which role(s) this preference accepts.
    pub mode: ReadPrefMode,
    /// Tag-predicate sets; a candidate matches if it satisfies at least one
    /// set in full. Empty means "no tag filtering."
    #[serde(default)]
    pub tag_sets: Vec<TagPredicate>,
    /// Latency acceptance window in milliseconds, added to the minimum
    /// observed latency when building the final candidate set.
    #[serde(default = "default_window_ms")]
    pub window_ms: u32,
}

fn default_window_ms() -> u32 {
    DEFAULT_WINDOW_MS
}

impl Default for ReadPreference {
    fn default() -> Self {
        Self {
            mode: ReadPrefMode::Primary,
            tag_sets: Vec::new(),
            window_ms: DEFAULT_WINDOW_MS,
        }
    }
}

impl ReadPreference {
    /// Builds a `Nearest` preference with no tags, at the default window.
    pub fn nearest() -> Self {
        Self {
            mode: ReadPrefMode::Nearest,
            ..Self::default()
        }
    }

    /// Returns a copy of `self` with `mode` forced to `Primary`.
    ///
    /// Used when the caller requested the `WRITE` connection flag (spec
    /// §4.5, "Write flag coupling" in the design notes): the flag itself has
    /// no acquisition-time effect, it only forces the selection pass onto
    /// the primary.
    pub fn forced_primary(&self) -> Self {
        Self {
            mode: ReadPrefMode::Primary,
            tag_sets: self.tag_sets.clone(),
            window_ms: self.window_ms,
        }
    }

    /// Returns a copy of `self` with `mode` forced to `Nearest`.
    ///
    /// Used by the `Standalone`/`MultiRouter` dispatch routine, which has no
    /// notion of primary/secondary from the client's perspective.
    pub fn forced_nearest(&self) -> Self {
        Self {
            mode: ReadPrefMode::Nearest,
            tag_sets: self.tag_sets.clone(),
            window_ms: self.window_ms,
        }
    }
}

/// Returns whether `tags` satisfies `predicate` (every key/value in
/// `predicate` is present in `tags`).
pub fn predicate_matches(predicate: &TagPredicate, tags: &HashMap<String, String>) -> bool {
    predicate
        .iter()
        .all(|(k, v)| tags.get(k).is_some_and(|tv| tv == v))
}

/// Returns whether `tags` satisfies at least one predicate set, or `true` if
/// `predicates` is empty (no tag filtering requested).
pub fn matches_any(predicates: &[TagPredicate], tags: &HashMap<String, String>) -> bool {
    predicates.is_empty() || predicates.iter().any(|p| predicate_matches(p, tags))
}
