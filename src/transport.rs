// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! External collaborator interfaces (spec §6): wire protocol, TCP I/O, and
//! BSON parsing are explicitly out of scope for this crate — callers supply
//! a `Transport` implementation that does the actual talking to a server.

use std::collections::HashMap;

use md5::{Digest as _, Md5};

use crate::{connection::ServerRole, error::ManagerError, seed::ServerDef};

/// Outcome of an `ismaster` probe (spec Design Notes: "Integer-coded
/// ismaster result" — this is the tagged-variant replacement for the
/// original `{0,1,2,3}` return codes).
#[derive(Debug, Clone)]
pub enum IsMasterOutcome {
    /// The connection/protocol itself failed; the connection should be
    /// deregistered.
    ProtocolError(String),
    /// The probe succeeded and the node is a legitimate member of the
    /// expected set; ingest its advertised member list.
    Ok(IsMasterReport),
    /// The probe was suppressed (e.g. by the `ismaster_interval` throttle);
    /// do nothing.
    Throttled,
    /// The probe succeeded, but the node reports it isn't really part of
    /// the expected set; deregister this connection, but still ingest its
    /// advertised member list.
    OkButNotAMember(IsMasterReport),
}

/// The payload of a successful `ismaster` reply.
#[derive(Debug, Clone, Default)]
pub struct IsMasterReport {
    /// This node's role.
    pub role: ServerRole,
    /// The replica-set name this node reports, if any.
    pub replica_set_name: Option<String>,
    /// `host:port` strings for every member this node is aware of.
    pub hosts: Vec<String>,
    /// Tag set this node advertises.
    pub tags: HashMap<String, String>,
    /// Measured round-trip latency for this probe, in microseconds.
    pub latency_us: u64,
}

/// The outcome of a successful `ping`.
#[derive(Debug, Clone, Copy)]
pub struct PingReport {
    /// Measured round-trip latency, in microseconds.
    pub latency_us: u64,
}

/// Transport & protocol collaborator the caller must supply (spec §6).
///
/// None of `dial`/`getnonce`/`authenticate`/`ping`/`ismaster` are
/// implemented by this crate: TCP I/O, the wire codec, and BSON parsing are
/// explicitly out of scope (§1). `Handle` is whatever socket/session value
/// `dial` produces; the manager only ever moves it around, never inspects
/// it.
pub trait Transport: Send + Sync + 'static {
    /// The transport-level handle returned by `dial` (a socket, a session
    /// object — opaque to the manager).
    type Handle: Send + Sync + std::fmt::Debug;

    /// Opens a new transport session to `server`.
    fn dial(
        &self,
        server: &ServerDef,
    ) -> impl Future<Output = Result<Self::Handle, ManagerError>> + Send;

    /// Fetches a nonce to use in the authenticate handshake's second step.
    fn getnonce(
        &self,
        handle: &Self::Handle,
    ) -> impl Future<Output = Result<String, ManagerError>> + Send;

    /// Submits the authenticate command using a previously fetched nonce.
    fn authenticate(
        &self,
        handle: &Self::Handle,
        db: &str,
        user: &str,
        password: &str,
        nonce: &str,
    ) -> impl Future<Output = Result<(), ManagerError>> + Send;

    /// Sends a liveness ping.
    fn ping(
        &self,
        handle: &Self::Handle,
    ) -> impl Future<Output = Result<PingReport, ManagerError>> + Send;

    /// Issues `ismaster`, carrying the in/out expected replica-set name
    /// (spec §4.4: "the collaborator both reads and writes that slot").
    fn ismaster(
        &self,
        handle: &Self::Handle,
        repl_set_name: &mut Option<String>,
        server: &ServerDef,
    ) -> impl Future<Output = IsMasterOutcome> + Send;
}

/// Stable one-way digest used as the authentication-scope key (spec §6).
///
/// Two connections authenticated with the same `(user, password)` pair
/// produce the same scope, so the selector's candidate filter can compare
/// scopes without ever storing a plaintext password on the `Connection`.
pub fn hashed_password(user: &str, password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(user.as_bytes());
    hasher.update(b":mongo:");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
