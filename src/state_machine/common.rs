// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The small state-machine discipline used for every multi-round-trip
//! exchange in this crate (spec §10.5). A state machine is a sequence of
//! `StateMachine` steps, each returning a `Transition`; a `StateMachineCtx`
//! drives the steps to completion.

use crate::error::ManagerError;

/// The outcome of a single state-machine step.
pub enum Transition<S, R> {
    /// Advance into a new state, carrying this step's result.
    Next(S, R),
    /// Remain logically in place (used by steps that can no-op).
    Stay(R),
    /// Terminal: the exchange is finished.
    Done(R),
}

/// A single state in a multi-step exchange over `Ctx`, producing `RespCtx`
/// when it completes or fails.
pub trait StateMachine<Ctx, RespCtx>: Sized {
    /// The future type returned by `step` (an associated type rather than
    /// `async fn` in trait so implementors can box it when the step needs
    /// to be stored or matched across an enum of states).
    type StepResult<'a>: Future<Output = RespCtx> + Send + 'a
    where
        Self: 'a,
        RespCtx: 'a,
        Ctx: 'a;

    /// Runs this state against `ctx`, producing a transition.
    fn step<'a>(&'a self, ctx: &'a mut Ctx) -> Self::StepResult<'a>;
}

/// Drives a `Ctx`'s internal state machine to completion.
pub trait StateMachineCtx<Ctx, Res> {
    /// Runs states in a loop until `Transition::Done`, returning the final
    /// result or the first error encountered.
    fn execute(&mut self) -> impl Future<Output = Result<Res, ManagerError>> + Send;
}
