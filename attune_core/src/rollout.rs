// attune_core/src/rollout.rs

//! Fixed-horizon forward simulation against a learned model.
//!
//! Two modes share the same stepping machinery:
//! * closed loop: a policy picks every action, the per-step costs are
//!   weighted by `discount^(horizon - k)` and averaged over the horizon;
//! * open loop: a whole batch of precomputed action sequences is advanced in
//!   lock-step and every per-step reward is recorded, undiscounted.

use crate::candidates::CandidateBatch;
use crate::cost::CostFunction;
use crate::env::Environment;
use crate::error::{AttuneError, AttuneResult};
use crate::history::{push_history, push_history_batch};
use crate::models::{predict_next, predict_next_batch, DynamicsModel};
use crate::policy::Policy;
use crate::types::{Cost, State, StateBatch};
use nalgebra::DMatrix;

/// Discount used by the tuning objective.
pub const DEFAULT_DISCOUNT: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RolloutConfig {
    horizon: usize,
    discount: f64,
}

impl RolloutConfig {
    pub fn new(horizon: usize, discount: f64) -> AttuneResult<Self> {
        if horizon == 0 {
            return Err(AttuneError::InvalidHorizon(horizon));
        }
        Ok(Self { horizon, discount })
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    /// Weight of step `k` (0-based). Later steps weigh more when
    /// `discount < 1`.
    pub fn weight(&self, k: usize) -> f64 {
        self.discount.powi((self.horizon - k) as i32)
    }

    pub fn total_weight(&self) -> f64 {
        (0..self.horizon).map(|k| self.weight(k)).sum()
    }
}

/// Pushes `next` into `history` when the model consumes a history window,
/// otherwise `next` simply becomes the new state.
pub fn advance(next: &State, history: &State) -> AttuneResult<State> {
    if history.len() == next.len() {
        Ok(next.clone())
    } else {
        push_history(next, history)
    }
}

fn advance_batch(next: &StateBatch, history: &StateBatch) -> AttuneResult<StateBatch> {
    if history.ncols() == next.ncols() {
        Ok(next.clone())
    } else {
        push_history_batch(next, history)
    }
}

/// Closed-loop rollout of `policy` from `initial_state`.
///
/// The first transition only primes the history buffer and is not scored.
/// Each of the following `horizon` steps asks the policy for an action from
/// the newest predicted state, advances the model from the full history
/// state, and accumulates `weight(k) · cost`. Returns the weighted sum
/// divided by the horizon.
///
/// The policy is not reset here; callers that need independent rollouts
/// reset it themselves.
pub fn rollout_cost(
    model: &dyn DynamicsModel,
    policy: &mut dyn Policy,
    cost_fn: &dyn CostFunction,
    initial_state: &State,
    config: &RolloutConfig,
) -> AttuneResult<Cost> {
    let action = policy.get_action(initial_state)?;
    let mut next_state = predict_next(model, initial_state, &action)?.next_state;
    let mut state = advance(&next_state, initial_state)?;

    let mut total = 0.0;
    for k in 0..config.horizon {
        let action = policy.get_action(&next_state)?;
        next_state = predict_next(model, &state, &action)?.next_state;
        state = advance(&next_state, &state)?;
        total += config.weight(k) * cost_fn.cost_single(&next_state, &action)?.value();
    }

    Ok(Cost(total / config.horizon as f64))
}

/// Open-loop rollout of every candidate in `candidates` from the same
/// `initial_state`.
///
/// All candidates advance together: step `t` is one batched model call on
/// the `t`-th action of every candidate. Returns the per-step rewards as a
/// (candidates × horizon) matrix. No discount is applied.
pub fn rollout_rewards(
    model: &dyn DynamicsModel,
    env: &dyn Environment,
    initial_state: &State,
    candidates: &CandidateBatch,
) -> AttuneResult<DMatrix<f64>> {
    let n = candidates.num_candidates();
    let mut state = StateBatch::from_fn(n, initial_state.len(), |_, j| initial_state[j]);
    let mut rewards = DMatrix::zeros(n, candidates.horizon());

    for t in 0..candidates.horizon() {
        let action_batch = candidates.step(t);
        let next_states = predict_next_batch(model, &state, action_batch)?.next_states;
        let step_rewards = env.reward(&next_states, action_batch)?;
        rewards.set_column(t, &step_rewards);
        state = advance_batch(&next_states, &state)?;
    }

    Ok(rewards)
}
