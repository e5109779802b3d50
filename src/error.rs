// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use thiserror::Error;

/// Errors surfaced by the connection manager's public API.
///
/// Each variant carries a human-readable message so callers that only want
/// to log or display the failure don't need to match on the kind, while
/// callers that do care about the kind can still do so.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManagerError {
    /// Opening the transport to a server failed.
    #[error("failed to connect to {endpoint}: {message}")]
    DialFailure {
        /// `host:port` of the endpoint that failed to dial.
        endpoint: String,
        /// Underlying failure description from the transport collaborator.
        message: String,
    },

    /// The login(nonce)/authenticate handshake failed.
    #[error("authentication failed for {endpoint}: {message}")]
    AuthFailure {
        /// `host:port` of the endpoint whose authentication failed.
        endpoint: String,
        /// Underlying failure description from the transport collaborator.
        message: String,
    },

    /// A liveness ping failed (either during acquisition or reuse).
    #[error("ping failed: {0}")]
    PingFailure(String),

    /// An `ismaster` or other protocol exchange could not be decoded.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The selector pipeline produced an empty candidate set.
    #[error("{0}")]
    NoCandidateServers(String),

    /// `SeedSet::deployment_type` did not match any known dispatch routine.
    ///
    /// Unreachable through [`crate::manager::Manager::get_read_write_connection`]
    /// today: [`crate::seed::DeploymentType`] is a closed three-variant enum
    /// and the dispatch `match` is exhaustive, so this can never actually be
    /// constructed by that call. Kept, not deleted, because it is one of the
    /// fixed error kinds spec'd for this crate's public surface (mirroring
    /// the original's `default:` branch on its connection-type switch) — a
    /// caller matching on `ManagerError` should still be able to name this
    /// variant, and a future `DeploymentType` variant added without updating
    /// every dispatch site should fail to compile (non-exhaustive match)
    /// rather than silently falling through to this arm.
    #[error("Unknown connection type requested")]
    UnknownDeploymentType,
}
