// attune_core/src/models/mod.rs

use crate::error::AttuneResult;
use crate::types::{Action, ActionBatch, State, StateBatch};
use dyn_clone::DynClone;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Target names ending in this suffix are predicted as a change to the
/// current state value rather than as the next absolute value.
pub const DELTA_SUFFIX: &str = "dx";

/// How a single model output maps back onto the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// `next = current + prediction`
    Delta,
    /// `next = prediction`
    Absolute,
}

impl TargetKind {
    pub fn from_name(name: &str) -> Self {
        if name.ends_with(DELTA_SUFFIX) {
            TargetKind::Delta
        } else {
            TargetKind::Absolute
        }
    }
}

/// The names a learned model was trained on. The order of each list defines
/// the layout of the corresponding vector.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// State feature columns the model consumes (including any history slices).
    pub state_columns: Vec<String>,
    /// Action input columns the model consumes (including any action history).
    pub input_columns: Vec<String>,
    /// Output columns. A trailing `dx` marks a delta target.
    pub target_columns: Vec<String>,
}

impl ModelMetadata {
    pub fn target_kinds(&self) -> Vec<TargetKind> {
        self.target_columns
            .iter()
            .map(|t| TargetKind::from_name(t))
            .collect()
    }

    /// True when the model consumes more state columns than it predicts, i.e.
    /// it expects a history-augmented state.
    pub fn uses_history(&self) -> bool {
        self.state_columns.len() > self.target_columns.len()
    }
}

/// A raw model output for one state/action pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub mean: DVector<f64>,
    pub log_variance: DVector<f64>,
}

/// A raw model output for a batch, one row per input row.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPrediction {
    pub mean: DMatrix<f64>,
    pub log_variance: DMatrix<f64>,
}

// --- LEARNED DYNAMICS MODEL TRAIT ---
// The explicit capability contract of a trained forward model:
// `(state, action) -> (prediction, log_variance)`.
pub trait DynamicsModel: DynClone + Debug + Send + Sync {
    /// The state/input/target names this model was trained on.
    fn metadata(&self) -> &ModelMetadata;

    /// Predicts the raw outputs for a single state and action.
    ///
    /// # Arguments
    /// * `state`: Exactly `metadata().state_columns.len()` entries.
    /// * `action`: Exactly `metadata().input_columns.len()` entries.
    ///
    /// # Returns
    /// One mean and one log-variance per target column.
    fn predict(&self, state: &State, action: &Action) -> AttuneResult<Prediction>;

    /// Predicts a whole batch. Models that can do this as one matrix
    /// computation should override the default row-by-row loop.
    fn predict_batch(
        &self,
        states: &StateBatch,
        actions: &ActionBatch,
    ) -> AttuneResult<BatchPrediction> {
        let n_out = self.metadata().target_columns.len();
        let mut mean = DMatrix::zeros(states.nrows(), n_out);
        let mut log_variance = DMatrix::zeros(states.nrows(), n_out);
        for i in 0..states.nrows() {
            let state = states.row(i).transpose();
            let action = actions.row(i).transpose();
            let p = self.predict(&state, &action)?;
            mean.set_row(i, &p.mean.transpose());
            log_variance.set_row(i, &p.log_variance.transpose());
        }
        Ok(BatchPrediction { mean, log_variance })
    }
}

// This macro automatically generates the implementation of `Clone` for `Box<dyn DynamicsModel>`.
dyn_clone::clone_trait_object!(DynamicsModel);

pub mod adapter;
pub mod linear;

pub use adapter::{expand_action, predict_next, predict_next_batch, BatchStep, StepPrediction};
pub use linear::LinearModel;
