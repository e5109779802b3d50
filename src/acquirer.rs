// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Single-Connection Acquirer (spec §4.3): look up or dial one endpoint,
//! authenticate, ping, insert into the registry.

use std::sync::Arc;

use crate::{
    connection::Connection,
    error::ManagerError,
    identity::identity,
    registry::Registry,
    seed::ServerDef,
    state_machine::{acquire::AcquireCtx, common::StateMachineCtx as _},
    transport::Transport,
};

/// Acquires a connection to `server`, per spec §4.3's lettered algorithm.
///
/// - Already registered, `dont_connect`: returned as-is, no ping.
/// - Already registered, otherwise: pinged; ping failure deregisters and
///   propagates the error.
/// - Not registered, `dont_connect`: `Ok(None)` (not an error — §7).
/// - Not registered, otherwise: dial, optionally authenticate, ping, then
///   register.
pub async fn acquire<T: Transport>(
    registry: &Registry<T::Handle>,
    transport: &T,
    server: &ServerDef,
    dont_connect: bool,
) -> Result<Option<Arc<Connection<T::Handle>>>, ManagerError> {
    let hash = identity(server);

    if let Some(conn) = registry.find(&hash) {
        if dont_connect {
            return Ok(Some(conn));
        }

        return match transport.ping(&conn.handle).await {
            Ok(report) => {
                conn.record_ping(report.latency_us).await;
                Ok(Some(conn))
            },
            Err(e) => {
                registry.deregister(&hash);
                Err(e)
            },
        };
    }

    if dont_connect {
        return Ok(None);
    }

    let mut ctx = AcquireCtx::new(transport, server);
    let acquired = ctx.execute().await?;

    let conn = Arc::new(Connection::new(hash, acquired.handle, acquired.auth_scope));
    conn.record_ping(acquired.latency_us).await;
    registry.register(Arc::clone(&conn));
    Ok(Some(conn))
}
