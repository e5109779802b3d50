// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! `MockTransport`: an in-memory `Transport` collaborator driven by canned,
//! per-endpoint scripts, plus call counters for leak/idempotence checks
//! (spec §10.4, §8 "verifiable by a mock transport counting open/close").

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicU32, Ordering},
    },
};

use docdb_conn_manager::{
    error::ManagerError,
    seed::ServerDef,
    transport::{IsMasterOutcome, PingReport, Transport},
};

/// Canned collaborator behavior for one `host:port`.
#[derive(Clone, Default)]
pub struct ServerScript {
    pub dial_ok: bool,
    pub auth_ok: bool,
    pub ping_ok: bool,
    pub ismaster: VecDeque<IsMasterOutcome>,
}

impl ServerScript {
    /// A server that dials, authenticates, and pings successfully, with no
    /// `ismaster` behavior configured (each call returns `Throttled`).
    pub fn reachable() -> Self {
        Self {
            dial_ok: true,
            auth_ok: true,
            ping_ok: true,
            ismaster: VecDeque::new(),
        }
    }

    pub fn dial_fails(mut self) -> Self {
        self.dial_ok = false;
        self
    }

    pub fn auth_fails(mut self) -> Self {
        self.auth_ok = false;
        self
    }

    pub fn ping_fails(mut self) -> Self {
        self.ping_ok = false;
        self
    }

    /// Queues one `ismaster` outcome; successive calls pop in FIFO order.
    pub fn with_ismaster(mut self, outcome: IsMasterOutcome) -> Self {
        self.ismaster.push_back(outcome);
        self
    }
}

/// The mock collaborator itself. `Handle` is just the `(host, port)` pair —
/// there is no real socket to hold.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<(String, u16), ServerScript>>,
    pub dial_calls: AtomicU32,
    pub ping_calls: AtomicU32,
    pub ismaster_calls: AtomicU32,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or replaces) the script for `host:port`.
    pub fn script(&self, host: &str, port: u16, script: ServerScript) {
        self.scripts
            .lock()
            .expect("mock transport mutex poisoned")
            .insert((host.to_string(), port), script);
    }
}

impl Transport for MockTransport {
    type Handle = (String, u16);

    async fn dial(&self, server: &ServerDef) -> Result<Self::Handle, ManagerError> {
        self.dial_calls.fetch_add(1, Ordering::SeqCst);
        let key = (server.host.clone(), server.port);
        let ok = self
            .scripts
            .lock()
            .expect("mock transport mutex poisoned")
            .get(&key)
            .map(|s| s.dial_ok)
            .unwrap_or(false);

        if ok {
            Ok(key)
        } else {
            Err(ManagerError::DialFailure {
                endpoint: server.display_endpoint(),
                message: "mock transport refused to dial".to_string(),
            })
        }
    }

    async fn getnonce(&self, _handle: &Self::Handle) -> Result<String, ManagerError> {
        Ok("mock-nonce".to_string())
    }

    async fn authenticate(
        &self,
        handle: &Self::Handle,
        _db: &str,
        _user: &str,
        _password: &str,
        _nonce: &str,
    ) -> Result<(), ManagerError> {
        let ok = self
            .scripts
            .lock()
            .expect("mock transport mutex poisoned")
            .get(handle)
            .map(|s| s.auth_ok)
            .unwrap_or(true);

        if ok {
            Ok(())
        } else {
            Err(ManagerError::AuthFailure {
                endpoint: format!("{}:{}", handle.0, handle.1),
                message: "mock transport rejected credentials".to_string(),
            })
        }
    }

    async fn ping(&self, handle: &Self::Handle) -> Result<PingReport, ManagerError> {
        self.ping_calls.fetch_add(1, Ordering::SeqCst);
        let ok = self
            .scripts
            .lock()
            .expect("mock transport mutex poisoned")
            .get(handle)
            .map(|s| s.ping_ok)
            .unwrap_or(true);

        if ok {
            Ok(PingReport { latency_us: 1_000 })
        } else {
            Err(ManagerError::PingFailure("mock transport ping failed".to_string()))
        }
    }

    async fn ismaster(
        &self,
        handle: &Self::Handle,
        repl_set_name: &mut Option<String>,
        _server: &ServerDef,
    ) -> IsMasterOutcome {
        self.ismaster_calls.fetch_add(1, Ordering::SeqCst);
        let mut scripts = self.scripts.lock().expect("mock transport mutex poisoned");
        let Some(script) = scripts.get_mut(handle) else {
            return IsMasterOutcome::Throttled;
        };
        let outcome = script.ismaster.pop_front().unwrap_or(IsMasterOutcome::Throttled);

        match &outcome {
            IsMasterOutcome::Ok(report) | IsMasterOutcome::OkButNotAMember(report) => {
                if repl_set_name.is_none() {
                    *repl_set_name = report.replica_set_name.clone();
                }
            },
            _ => {},
        }

        outcome
    }
}

/// A bare, unauthenticated endpoint descriptor for test fixtures.
pub fn test_server(host: &str, port: u16) -> ServerDef {
    ServerDef::new(host, port)
}

/// An endpoint descriptor with the given credentials for test fixtures.
pub fn auth_server(host: &str, port: u16, db: &str, user: &str, password: &str) -> ServerDef {
    ServerDef {
        host: host.to_string(),
        port,
        auth_db: Some(db.to_string()),
        username: Some(user.to_string()),
        password: Some(password.to_string()),
    }
}
