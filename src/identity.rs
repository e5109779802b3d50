// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Canonical pool keys for endpoints (spec §4.1).

use std::fmt::Write as _;

use crate::seed::ServerDef;

/// Builds the canonical identity hash for a `ServerDef`.
///
/// Two `ServerDef`s that agree on `(host, port, auth_db, username,
/// password)` MUST produce the same key here; any difference in one of those
/// fields MUST produce a different key. This is a formatting contract, not a
/// cryptographic digest — collisions are prevented by construction (each
/// field is length-prefixed) rather than by hash strength.
pub fn identity(server: &ServerDef) -> String {
    let mut out = String::with_capacity(64);
    push_field(&mut out, &server.host);
    let _ = write!(out, "{}", server.port);
    out.push(':');
    push_field(&mut out, server.auth_db.as_deref().unwrap_or(""));
    push_field(&mut out, server.username.as_deref().unwrap_or(""));
    push_field(&mut out, server.password.as_deref().unwrap_or(""));
    out
}

/// Appends `field` length-prefixed so that e.g. `host="ab"` + `port=""` can
/// never collide with `host="a"` + `port="b"`.
fn push_field(out: &mut String, field: &str) {
    let _ = write!(out, "{}|{}/", field.len(), field);
}
