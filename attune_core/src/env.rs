// attune_core/src/env.rs

use crate::cost::{AttitudeCost, CostFunction};
use crate::error::{AttuneError, AttuneResult};
use crate::types::{Action, ActionBatch, StateBatch};
use dyn_clone::DynClone;
use nalgebra::DVector;
use std::fmt::Debug;

/// Per-dimension bounds of the actions an environment accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpace {
    low: Action,
    high: Action,
}

impl ActionSpace {
    pub fn new(low: Action, high: Action) -> AttuneResult<Self> {
        if low.is_empty() {
            return Err(AttuneError::InvalidActionSpace(
                "action space has no dimensions".to_string(),
            ));
        }
        if low.len() != high.len() {
            return Err(AttuneError::InvalidActionSpace(format!(
                "low has {} dimensions but high has {}",
                low.len(),
                high.len()
            )));
        }
        for (i, (lo, hi)) in low.iter().zip(high.iter()).enumerate() {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(AttuneError::InvalidActionSpace(format!(
                    "dimension {i} has bounds [{lo}, {hi}]"
                )));
            }
        }
        Ok(Self { low, high })
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn low(&self) -> &Action {
        &self.low
    }

    pub fn high(&self) -> &Action {
        &self.high
    }

    /// Clamps `action` into the space, dimension by dimension.
    pub fn clip(&self, action: &Action) -> Action {
        action.zip_zip_map(&self.low, &self.high, |a, lo, hi| a.clamp(lo, hi))
    }
}

// --- ENVIRONMENT TRAIT ---
// What the MPC planner needs from the environment: where actions may be
// sampled from and how a batch of transitions is rewarded.
pub trait Environment: DynClone + Debug + Send + Sync {
    fn action_space(&self) -> &ActionSpace;

    /// One reward per row of `next_states`. Higher is better.
    fn reward(&self, next_states: &StateBatch, actions: &ActionBatch) -> AttuneResult<DVector<f64>>;
}

dyn_clone::clone_trait_object!(Environment);

/// Rewards level flight: the negated `AttitudeCost`.
#[derive(Debug, Clone)]
pub struct AttitudeEnvironment {
    action_space: ActionSpace,
    cost: AttitudeCost,
}

impl AttitudeEnvironment {
    pub fn new(action_space: ActionSpace) -> Self {
        Self {
            action_space,
            cost: AttitudeCost::default(),
        }
    }
}

impl Environment for AttitudeEnvironment {
    fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    fn reward(&self, next_states: &StateBatch, actions: &ActionBatch) -> AttuneResult<DVector<f64>> {
        Ok(-self.cost.cost(next_states, actions)?)
    }
}
