// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Loads a `ManagerConfig` and a `SeedSet` from YAML, builds a `Manager`
//! over a minimal demo [`Transport`], and resolves one connection.
//!
//! The wire protocol (`ismaster`/`getnonce`/`authenticate`/`ping` encoding,
//! BSON parsing) is explicitly out of scope for this crate (spec §1); the
//! `TcpTransport` below only dials a real TCP socket to prove reachability
//! and otherwise returns canned collaborator responses, so this binary
//! demonstrates the manager's API surface rather than a real driver.

use std::{collections::HashMap, time::Instant};

use anyhow::{Context, Result};
use docdb_conn_manager::{
    cfg::{cli::resolve_config_path, config::ManagerConfig, logger::init_logger},
    error::ManagerError,
    manager::{ConnFlags, Manager, TracingSink},
    seed::SeedSet,
    transport::{IsMasterOutcome, IsMasterReport, PingReport, Transport},
};
use tokio::net::TcpStream;
use tracing::info;

/// Demo-only collaborator: dials a real socket, fabricates the rest.
struct TcpTransport;

impl Transport for TcpTransport {
    type Handle = TcpStream;

    async fn dial(
        &self,
        server: &docdb_conn_manager::seed::ServerDef,
    ) -> Result<Self::Handle, ManagerError> {
        TcpStream::connect((server.host.as_str(), server.port))
            .await
            .map_err(|e| ManagerError::DialFailure {
                endpoint: server.display_endpoint(),
                message: e.to_string(),
            })
    }

    async fn getnonce(&self, _handle: &Self::Handle) -> Result<String, ManagerError> {
        Ok("demo-nonce".to_string())
    }

    async fn authenticate(
        &self,
        _handle: &Self::Handle,
        _db: &str,
        _user: &str,
        _password: &str,
        _nonce: &str,
    ) -> Result<(), ManagerError> {
        Ok(())
    }

    async fn ping(&self, handle: &Self::Handle) -> Result<PingReport, ManagerError> {
        let start = Instant::now();
        handle
            .writable()
            .await
            .map_err(|e| ManagerError::PingFailure(e.to_string()))?;
        Ok(PingReport {
            latency_us: start.elapsed().as_micros() as u64,
        })
    }

    async fn ismaster(
        &self,
        _handle: &Self::Handle,
        repl_set_name: &mut Option<String>,
        _server: &docdb_conn_manager::seed::ServerDef,
    ) -> IsMasterOutcome {
        IsMasterOutcome::Ok(IsMasterReport {
            role: docdb_conn_manager::connection::ServerRole::Primary,
            replica_set_name: repl_set_name.clone(),
            hosts: Vec::new(),
            tags: HashMap::new(),
            latency_us: 0,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_logger("demos/config_logger.yaml")?;

    let manager_cfg = resolve_config_path("demos/config.manager.yaml")
        .and_then(ManagerConfig::load_from_file)
        .context("failed to resolve or load manager config")?;

    let mut seeds: SeedSet = resolve_config_path("demos/seeds.replicaset.yaml")
        .and_then(|p| {
            let s = std::fs::read_to_string(p)?;
            serde_yaml::from_str(&s).context("failed to parse seeds YAML")
        })
        .context("failed to resolve or load seed set")?;

    let mut manager = Manager::init(TcpTransport);
    manager.set_log(std::sync::Arc::new(TracingSink));
    manager.set_intervals(
        manager_cfg.ping_interval_secs,
        manager_cfg.ismaster_interval_secs,
    );

    match manager
        .get_read_write_connection(&mut seeds, ConnFlags::empty())
        .await
    {
        Ok(Some(conn)) => {
            info!(hash = %conn.hash, "resolved a connection");
        },
        Ok(None) => {
            info!("no cached connection available (DONT_CONNECT with empty registry)");
        },
        Err(e) => {
            info!(error = %e, "failed to resolve a connection");
        },
    }

    manager.deinit();
    Ok(())
}
