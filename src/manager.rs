// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Manager Facade + Logging (spec §4.6, §6): the crate's single entry point,
//! `get_read_write_connection`, plus the pluggable log sink capability.

use std::sync::Arc;

use bitflags::bitflags;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::{
    connection::Connection,
    error::ManagerError,
    registry::Registry,
    seed::{DeploymentType, SeedSet},
    selector,
    transport::Transport,
};

bitflags! {
    /// Connection flags understood by `get_read_write_connection` (spec §6).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConnFlags: u8 {
        /// The caller needs a write-capable (primary) connection.
        const WRITE = 0b001;
        /// Never dial; only return an already-cached connection.
        const DONT_CONNECT = 0b010;
        /// The caller's `ReadPreference` carries tag predicates to honor.
        const READ_PREFERENCE_TAGS = 0b100;
    }
}

/// Log severity, mirrored from the source's `{WARN, INFO, FINE}` levels
/// (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Something is probably wrong but the call can proceed.
    Warn,
    /// Routine, user-relevant progress.
    Info,
    /// High-volume diagnostic detail.
    Fine,
}

/// Which component logged this record, used as a module tag (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    /// `src/acquirer.rs`.
    Acquirer,
    /// `src/discovery.rs`.
    Discovery,
    /// `src/selector.rs`.
    Selector,
    /// `src/manager.rs` itself.
    Manager,
}

impl Module {
    fn as_str(self) -> &'static str {
        match self {
            Module::Acquirer => "acquirer",
            Module::Discovery => "discovery",
            Module::Selector => "selector",
            Module::Manager => "manager",
        }
    }
}

/// Pluggable log sink capability (spec §4.6, §9 "Polymorphic log sink").
///
/// Replaces the source's function-pointer-plus-opaque-context pair with a
/// plain trait object; a closure captures whatever state a C `void*` context
/// would have carried.
pub trait LogSink: Send + Sync {
    /// Records one log line.
    fn log(&self, module: Module, level: LogLevel, message: &str);
}

/// The default sink: discards every record.
#[derive(Debug, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _module: Module, _level: LogLevel, _message: &str) {}
}

/// Forwards records into the host process's `tracing` subscriber, if any.
#[derive(Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, module: Module, level: LogLevel, message: &str) {
        let module = module.as_str();
        match level {
            LogLevel::Warn => warn!(module, "{message}"),
            LogLevel::Info => info!(module, "{message}"),
            LogLevel::Fine => debug!(module, "{message}"),
        }
    }
}

/// Process-scoped connection-manager state (spec §3): a registry, a log
/// sink, and the two probe intervals. Explicitly threaded through every
/// call — no global singleton (spec §9 "Global mutable state").
pub struct Manager<T: Transport> {
    transport: T,
    registry: Registry<T::Handle>,
    log_sink: Arc<dyn LogSink>,
    ping_interval_secs: u32,
    ismaster_interval_secs: u32,
    /// Serializes topology-discovery runs so at most one is ever in flight
    /// per manager (spec §5).
    discovery_lock: AsyncMutex<()>,
}

impl<T: Transport> Manager<T> {
    /// `manager_init` (spec §6): an empty registry and the null log sink.
    pub fn init(transport: T) -> Self {
        Self {
            transport,
            registry: Registry::new(),
            log_sink: Arc::new(NullSink),
            ping_interval_secs: 10,
            ismaster_interval_secs: 10,
            discovery_lock: AsyncMutex::new(()),
        }
    }

    /// `manager_deinit` (spec §6): destroys every registered connection.
    pub fn deinit(&self) {
        self.registry.destroy_all();
    }

    /// `manager_set_log` (spec §6).
    pub fn set_log(&mut self, sink: Arc<dyn LogSink>) {
        self.log_sink = sink;
    }

    /// `manager_set_intervals` (spec §6).
    pub fn set_intervals(&mut self, ping_secs: u32, ismaster_secs: u32) {
        self.ping_interval_secs = ping_secs;
        self.ismaster_interval_secs = ismaster_secs;
    }

    /// Probe interval used to throttle reuse-time pings.
    pub fn ping_interval_secs(&self) -> u32 {
        self.ping_interval_secs
    }

    /// Probe interval used to throttle discovery's `ismaster` calls.
    pub fn ismaster_interval_secs(&self) -> u32 {
        self.ismaster_interval_secs
    }

    /// Number of connections currently registered.
    pub fn registered_count(&self) -> usize {
        self.registry.len()
    }

    /// `get_read_write_connection` (spec §4.6, §6): dispatches on
    /// `seeds.deployment_type` to the mode-specific routine.
    ///
    /// Returns `Ok(None)` only for the preserved Open Question #1 case
    /// (`DONT_CONNECT` with no cached server and `Standalone`/`MultiRouter`
    /// deployments) — see DESIGN.md.
    pub async fn get_read_write_connection(
        &self,
        seeds: &mut SeedSet,
        flags: ConnFlags,
    ) -> Result<Option<Arc<Connection<T::Handle>>>, ManagerError> {
        let dont_connect = flags.contains(ConnFlags::DONT_CONNECT);
        let want_write = flags.contains(ConnFlags::WRITE);

        match seeds.deployment_type {
            DeploymentType::Standalone | DeploymentType::MultiRouter => {
                self.log_sink.log(Module::Manager, LogLevel::Fine, "dispatching get_connection_multiple");
                selector::get_connection_multiple(&self.registry, &self.transport, seeds, dont_connect, self.log_sink.as_ref()).await
            },
            DeploymentType::ReplicaSet => {
                self.log_sink.log(Module::Manager, LogLevel::Fine, "dispatching replica-set acquisition and discovery");
                let _guard = self.discovery_lock.lock().await;
                selector::get_read_write_connection_replicaset(
                    &self.registry,
                    &self.transport,
                    seeds,
                    want_write,
                    dont_connect,
                    self.log_sink.as_ref(),
                )
                .await
                .map(Some)
            },
        }
    }
}
