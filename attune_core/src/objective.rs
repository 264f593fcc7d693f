// attune_core/src/objective.rs

use crate::cost::CostFunction;
use crate::error::{AttuneError, AttuneResult};
use crate::models::DynamicsModel;
use crate::policy::{partition_gains, PidPolicy, Policy};
use crate::rollout::{rollout_cost, RolloutConfig};
use crate::types::{Cost, State};
use tracing::debug;

// --- OBJECTIVE TRAIT ---
// The only thing a black-box optimizer knows about the problem: a function
// of a parameter vector that returns a scalar to minimize.
pub trait Objective {
    /// Length of the parameter vector `evaluate` expects.
    fn dimension(&self) -> usize;

    fn evaluate(&mut self, params: &[f64]) -> AttuneResult<f64>;
}

/// Scores a set of PID gains by rolling the PID policy out through the
/// learned model from every state of a fixed evaluation set.
#[derive(Debug)]
pub struct PidObjective<'a> {
    model: &'a dyn DynamicsModel,
    cost_fn: &'a dyn CostFunction,
    policy: PidPolicy,
    initial_states: Vec<State>,
    rollout: RolloutConfig,
}

impl<'a> PidObjective<'a> {
    pub fn new(
        model: &'a dyn DynamicsModel,
        cost_fn: &'a dyn CostFunction,
        policy: PidPolicy,
        initial_states: Vec<State>,
        rollout: RolloutConfig,
    ) -> AttuneResult<Self> {
        let (parameters, controllers) = (policy.num_parameters(), policy.num_pids());
        if controllers == 0 || parameters % controllers != 0 {
            return Err(AttuneError::Partition {
                parameters,
                controllers,
            });
        }
        if initial_states.is_empty() {
            return Err(AttuneError::EmptyEvaluationSet);
        }
        Ok(Self {
            model,
            cost_fn,
            policy,
            initial_states,
            rollout,
        })
    }

    pub fn policy(&self) -> &PidPolicy {
        &self.policy
    }

    pub fn initial_states(&self) -> &[State] {
        &self.initial_states
    }

    /// Closed-loop cost of the policy's current gains from a single initial
    /// state. The policy is not reset.
    pub fn rollout_from(&mut self, initial_state: &State) -> AttuneResult<Cost> {
        rollout_cost(
            self.model,
            &mut self.policy,
            self.cost_fn,
            initial_state,
            &self.rollout,
        )
    }

    /// Installs `params` as the policy's gains and resets its integrator and
    /// derivative history, then sums the rollout cost over the evaluation set.
    pub fn evaluate_gains(&mut self, params: &[f64]) -> AttuneResult<Cost> {
        let gains = partition_gains(params, self.policy.num_pids(), self.policy.layout())?;
        self.policy.set_params(&gains)?;
        self.policy.reset();

        let mut total = Cost(0.0);
        for s0 in &self.initial_states {
            total = total
                + rollout_cost(
                    self.model,
                    &mut self.policy,
                    self.cost_fn,
                    s0,
                    &self.rollout,
                )?;
        }
        debug!(?params, cost = total.value(), "evaluated PID gains");
        Ok(total)
    }
}

impl Objective for PidObjective<'_> {
    fn dimension(&self) -> usize {
        self.policy.num_parameters()
    }

    fn evaluate(&mut self, params: &[f64]) -> AttuneResult<f64> {
        Ok(self.evaluate_gains(params)?.value())
    }
}
