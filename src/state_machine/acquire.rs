// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The per-connection acquire state machine (spec §4.3, §4.6, §10.5):
//! `Dialing -> Authenticating -> Pingable`. `Classified`/`Evicted` are
//! reached afterwards, outside of acquisition proper, by the topology
//! discoverer (`ismaster` success/failure) and by reuse-time pings; see
//! `crate::acquirer` and `crate::discovery`.

use std::marker::PhantomData;

use crate::{
    error::ManagerError,
    seed::ServerDef,
    state_machine::common::{StateMachine, StateMachineCtx, Transition},
    transport::{Transport, hashed_password},
};

/// Context threaded through a single acquire attempt.
///
/// Mirrors the teacher's `LoginCtx`/`NopCtx` shape: a `_lt` phantom to anchor
/// a borrow lifetime, a `state: Option<States>` taken and replaced each
/// iteration of `execute`, and scratch fields the individual steps fill in.
pub struct AcquireCtx<'a, T: Transport> {
    _lt: PhantomData<&'a ()>,

    transport: &'a T,
    server: &'a ServerDef,

    handle: Option<T::Handle>,
    latency_us: u64,

    state: Option<AcquireStates>,
}

impl<'a, T: Transport> AcquireCtx<'a, T> {
    /// Starts a new dial-then-authenticate-then-ping attempt against
    /// `server`.
    pub fn new(transport: &'a T, server: &'a ServerDef) -> Self {
        Self {
            _lt: PhantomData,
            transport,
            server,
            handle: None,
            latency_us: 0,
            state: Some(AcquireStates::Dialing(Dialing)),
        }
    }

    async fn dial(&mut self) -> Result<(), ManagerError> {
        let handle = self.transport.dial(self.server).await?;
        self.handle = Some(handle);
        Ok(())
    }

    async fn authenticate(&mut self) -> Result<(), ManagerError> {
        let handle = self.handle.as_ref().expect("handle set by Dialing state");
        let db = self.server.auth_db.as_deref().unwrap_or_default();
        let user = self.server.username.as_deref().unwrap_or_default();
        let password = self.server.password.as_deref().unwrap_or_default();

        let nonce = self.transport.getnonce(handle).await.map_err(|e| {
            ManagerError::AuthFailure {
                endpoint: self.server.display_endpoint(),
                message: e.to_string(),
            }
        })?;
        self.transport
            .authenticate(handle, db, user, password, &nonce)
            .await
            .map_err(|e| ManagerError::AuthFailure {
                endpoint: self.server.display_endpoint(),
                message: e.to_string(),
            })
    }

    async fn ping(&mut self) -> Result<(), ManagerError> {
        let handle = self.handle.as_ref().expect("handle set by Dialing state");
        let report = self.transport.ping(handle).await?;
        self.latency_us = report.latency_us;
        Ok(())
    }
}

/// Outcome of a finished acquire attempt: the dialed (and possibly
/// authenticated) handle, its measured latency, and the auth scope it was
/// authenticated under (`None` if `server` carried no credentials).
pub struct Acquired<H> {
    /// The dialed transport handle.
    pub handle: H,
    /// Latency measured by the final ping, in microseconds.
    pub latency_us: u64,
    /// Hashed `(user, password)`, if this acquisition authenticated.
    pub auth_scope: Option<String>,
}

/// Initial state: open the transport.
pub struct Dialing;
/// Run the two-step nonce/authenticate handshake (only entered when the
/// server carries full credentials).
pub struct Authenticating;
/// Final liveness check before the connection is handed back to the caller.
pub struct Pinging;

enum AcquireStates {
    Dialing(Dialing),
    Authenticating(Authenticating),
    Pinging(Pinging),
}

type AcquireStepOut = Transition<AcquireStates, Result<(), ManagerError>>;

impl<'ctx, T: Transport> StateMachine<AcquireCtx<'ctx, T>, AcquireStepOut> for Dialing {
    type StepResult<'a>
        = std::pin::Pin<Box<dyn Future<Output = AcquireStepOut> + Send + 'a>>
    where
        Self: 'a,
        AcquireCtx<'ctx, T>: 'a;

    fn step<'a>(&'a self, ctx: &'a mut AcquireCtx<'ctx, T>) -> Self::StepResult<'a> {
        Box::pin(async move {
            if let Err(e) = ctx.dial().await {
                return Transition::Done(Err(e));
            }
            if ctx.server.has_auth() {
                Transition::Next(AcquireStates::Authenticating(Authenticating), Ok(()))
            } else {
                Transition::Next(AcquireStates::Pinging(Pinging), Ok(()))
            }
        })
    }
}

impl<'ctx, T: Transport> StateMachine<AcquireCtx<'ctx, T>, AcquireStepOut> for Authenticating {
    type StepResult<'a>
        = std::pin::Pin<Box<dyn Future<Output = AcquireStepOut> + Send + 'a>>
    where
        Self: 'a,
        AcquireCtx<'ctx, T>: 'a;

    fn step<'a>(&'a self, ctx: &'a mut AcquireCtx<'ctx, T>) -> Self::StepResult<'a> {
        Box::pin(async move {
            match ctx.authenticate().await {
                Ok(()) => Transition::Next(AcquireStates::Pinging(Pinging), Ok(())),
                Err(e) => Transition::Done(Err(e)),
            }
        })
    }
}

impl<'ctx, T: Transport> StateMachine<AcquireCtx<'ctx, T>, AcquireStepOut> for Pinging {
    type StepResult<'a>
        = std::pin::Pin<Box<dyn Future<Output = AcquireStepOut> + Send + 'a>>
    where
        Self: 'a,
        AcquireCtx<'ctx, T>: 'a;

    fn step<'a>(&'a self, ctx: &'a mut AcquireCtx<'ctx, T>) -> Self::StepResult<'a> {
        Box::pin(async move {
            match ctx.ping().await {
                Ok(()) => Transition::Done(Ok(())),
                Err(e) => Transition::Done(Err(ManagerError::PingFailure(e.to_string()))),
            }
        })
    }
}

impl<'ctx, T: Transport> StateMachineCtx<AcquireCtx<'ctx, T>, Acquired<T::Handle>> for AcquireCtx<'ctx, T> {
    async fn execute(&mut self) -> Result<Acquired<T::Handle>, ManagerError> {
        loop {
            let state = self
                .state
                .take()
                .expect("AcquireCtx::execute called after completion");
            let transition = match state {
                AcquireStates::Dialing(s) => s.step(self).await,
                AcquireStates::Authenticating(s) => s.step(self).await,
                AcquireStates::Pinging(s) => s.step(self).await,
            };

            match transition {
                Transition::Next(next, Ok(())) => self.state = Some(next),
                Transition::Next(_, Err(e)) | Transition::Stay(Err(e)) | Transition::Done(Err(e)) => {
                    return Err(e);
                },
                Transition::Stay(Ok(())) => {},
                Transition::Done(Ok(())) => {
                    let handle = self.handle.take().expect("handle set by Dialing state");
                    let auth_scope = self.server.has_auth().then(|| {
                        hashed_password(
                            self.server.username.as_deref().unwrap_or_default(),
                            self.server.password.as_deref().unwrap_or_default(),
                        )
                    });
                    return Ok(Acquired {
                        handle,
                        latency_us: self.latency_us,
                        auth_scope,
                    });
                },
            }
        }
    }
}
