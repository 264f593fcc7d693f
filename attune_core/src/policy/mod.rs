// attune_core/src/policy/mod.rs

use crate::error::AttuneResult;
use crate::types::{Action, State};
use std::fmt::Debug;

// --- POLICY TRAIT ---
// Anything that turns the current state into an action: a PID stack during
// tuning, or the MPC planner.
pub trait Policy: Debug {
    /// Computes the action to apply in `state`.
    ///
    /// Takes `&mut self` so policies can carry internal state between calls
    /// (e.g. the integral and derivative terms of a PID).
    fn get_action(&mut self, state: &State) -> AttuneResult<Action>;

    /// Clears any state carried between calls. Independent rollouts must
    /// start from a reset policy.
    fn reset(&mut self);
}

pub mod pid;

pub use pid::{
    partition_gains, quad_plus_mixer, GainLayout, PidChannel, PidController, PidGains, PidPolicy,
};
