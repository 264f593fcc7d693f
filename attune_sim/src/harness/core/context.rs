// attune_sim/src/harness/core/context.rs

use attune_core::models::linear::LinearModel;
use attune_core::models::DynamicsModel;
use attune_core::types::State;
use tracing::info;

use super::data::{load_model, load_trajectory, permissible_states, Trajectory};
use super::prng::ExperimentRng;
use crate::error::HarnessResult;
use crate::harness::config::ExperimentConfig;

/// Everything a run needs, loaded once and passed explicitly to the runners.
#[derive(Debug)]
pub struct ExperimentContext {
    pub config: ExperimentConfig,
    pub model: LinearModel,
    pub trajectory: Trajectory,
    /// Logged states near level flight, the evaluation set of the objective.
    pub initial_states: Vec<State>,
    pub rng: ExperimentRng,
}

impl ExperimentContext {
    pub fn load(config: ExperimentConfig) -> HarnessResult<Self> {
        let model = load_model(&config.data.model_file)?;
        let trajectory = load_trajectory(&config.data.trajectory_csv, model.metadata())?;
        Self::from_parts(config, model, trajectory)
    }

    pub fn from_parts(
        config: ExperimentConfig,
        model: LinearModel,
        trajectory: Trajectory,
    ) -> HarnessResult<Self> {
        let initial_states = permissible_states(
            &trajectory.states,
            config.data.max_abs_pitch,
            config.data.max_abs_roll,
        )?;
        info!(
            permissible = initial_states.len(),
            total = trajectory.len(),
            "Selected initial states near level flight"
        );
        let rng = ExperimentRng::new(config.experiment.seed)?;
        Ok(Self {
            config,
            model,
            trajectory,
            initial_states,
            rng,
        })
    }
}
