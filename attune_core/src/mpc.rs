// attune_core/src/mpc.rs

//! Random-shooting Model Predictive Control.
//!
//! Every call samples `N` action sequences of length `T`, rolls all of them
//! forward through the learned model in one batch, and executes only the
//! first action of the sequence with the highest cumulative reward.

use crate::candidates::{ActionSampler, CandidateBatch};
use crate::env::Environment;
use crate::error::{AttuneError, AttuneResult};
use crate::models::DynamicsModel;
use crate::policy::Policy;
use crate::rollout::rollout_rewards;
use crate::types::{Action, State};
use nalgebra::{DMatrix, DVector};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpcConfig {
    /// Number of sampled candidate sequences (`N`).
    pub n_candidates: usize,
    /// Planning horizon in steps (`T`).
    pub horizon: usize,
    /// Sample one action per candidate and hold it over the horizon.
    pub hold: bool,
}

impl MpcConfig {
    pub fn validate(&self) -> AttuneResult<()> {
        if self.n_candidates == 0 {
            return Err(AttuneError::InvalidCandidateCount);
        }
        if self.horizon == 0 {
            return Err(AttuneError::InvalidHorizon(self.horizon));
        }
        Ok(())
    }
}

/// The outcome of one planning call.
#[derive(Debug, Clone)]
pub struct MpcPlan {
    pub best_index: usize,
    /// Sum over the horizon of each candidate's per-step rewards.
    pub cumulative_rewards: DVector<f64>,
    /// (horizon × action_dim)
    pub best_sequence: DMatrix<f64>,
}

impl MpcPlan {
    pub fn best_action(&self) -> Action {
        self.best_sequence.row(0).transpose()
    }

    pub fn best_reward(&self) -> f64 {
        self.cumulative_rewards[self.best_index]
    }
}

/// Index of the first maximum. NaN never wins unless every value is NaN, in
/// which case the first index is returned.
pub fn stable_argmax(values: &DVector<f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    let mut found = false;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if !found || v > best_value {
            best = i;
            best_value = v;
            found = true;
        }
    }
    best
}

#[derive(Debug, Clone)]
pub struct MpcPolicy {
    model: Box<dyn DynamicsModel>,
    env: Box<dyn Environment>,
    config: MpcConfig,
    sampler: ActionSampler,
    rng: ChaCha8Rng,
}

impl MpcPolicy {
    pub fn new(
        model: Box<dyn DynamicsModel>,
        env: Box<dyn Environment>,
        config: MpcConfig,
        rng: ChaCha8Rng,
    ) -> AttuneResult<Self> {
        config.validate()?;
        let sampler = ActionSampler::new(env.action_space());
        Ok(Self {
            model,
            env,
            config,
            sampler,
            rng,
        })
    }

    pub fn config(&self) -> &MpcConfig {
        &self.config
    }

    /// Draws a fresh candidate batch from the environment's action space.
    pub fn sample_candidates(&mut self) -> AttuneResult<CandidateBatch> {
        self.sampler.sample(
            self.config.n_candidates,
            self.config.horizon,
            self.config.hold,
            &mut self.rng,
        )
    }

    /// Scores `candidates` from `state` and picks the best one.
    pub fn evaluate_candidates(
        &self,
        state: &State,
        candidates: &CandidateBatch,
    ) -> AttuneResult<MpcPlan> {
        let rewards = rollout_rewards(self.model.as_ref(), self.env.as_ref(), state, candidates)?;
        let cumulative_rewards: DVector<f64> = rewards.column_sum();
        let best_index = stable_argmax(&cumulative_rewards);
        Ok(MpcPlan {
            best_index,
            best_sequence: candidates.sequence(best_index),
            cumulative_rewards,
        })
    }

    /// Samples, rolls out and ranks a fresh candidate batch.
    pub fn plan(&mut self, state: &State) -> AttuneResult<MpcPlan> {
        let candidates = self.sample_candidates()?;
        let plan = self.evaluate_candidates(state, &candidates)?;
        debug!(
            best = plan.best_index,
            reward = plan.best_reward(),
            "MPC plan selected"
        );
        Ok(plan)
    }

    /// Receding-horizon control: only the first action of the best sequence
    /// is returned.
    pub fn select_action(&mut self, state: &State) -> AttuneResult<Action> {
        Ok(self.plan(state)?.best_action())
    }
}

impl Policy for MpcPolicy {
    fn get_action(&mut self, state: &State) -> AttuneResult<Action> {
        self.select_action(state)
    }

    fn reset(&mut self) {
        debug!("MPC policy carries no state between calls, nothing to reset");
    }
}
