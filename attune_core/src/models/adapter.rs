// attune_core/src/models/adapter.rs

//! Turns raw model outputs into next states.
//!
//! A learned model predicts one value per target column. Targets whose name
//! carries the delta suffix are added to the current state, the rest
//! overwrite it. Actions shorter than the model's declared inputs are tiled
//! when the model was trained on a history of actions.

use super::{DynamicsModel, TargetKind};
use crate::error::{AttuneError, AttuneResult};
use crate::types::{Action, ActionBatch, State, StateBatch};
use nalgebra::{DMatrix, DVector};

/// The state after one model step, along with the predicted variance of each
/// target (already mapped out of the log domain).
#[derive(Debug, Clone, PartialEq)]
pub struct StepPrediction {
    pub next_state: State,
    pub variance: DVector<f64>,
}

/// `StepPrediction` for a batch, one row per candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStep {
    pub next_states: StateBatch,
    pub variance: DMatrix<f64>,
}

/// Number of times an action of length `given` must be repeated to fill
/// `expected` model inputs.
fn tiling_factor(given: usize, expected: usize) -> AttuneResult<usize> {
    if given == 0 || given > expected || expected % given != 0 {
        return Err(AttuneError::DimensionMismatch {
            context: "action expansion",
            expected,
            found: given,
        });
    }
    Ok(expected / given)
}

/// Repeats `action` end to end until it has `expected` entries.
pub fn expand_action(action: &Action, expected: usize) -> AttuneResult<Action> {
    let reps = tiling_factor(action.len(), expected)?;
    if reps == 1 {
        return Ok(action.clone());
    }
    Ok(Action::from_iterator(
        expected,
        action.iter().copied().cycle().take(expected),
    ))
}

fn expand_action_batch(actions: &ActionBatch, expected: usize) -> AttuneResult<ActionBatch> {
    let given = actions.ncols();
    let reps = tiling_factor(given, expected)?;
    if reps == 1 {
        return Ok(actions.clone());
    }
    let mut tiled = ActionBatch::zeros(actions.nrows(), expected);
    for r in 0..reps {
        tiled.columns_mut(r * given, given).copy_from(actions);
    }
    Ok(tiled)
}

/// The leading state columns the model consumes. The state must also be wide
/// enough to hold every target.
fn model_input_width(state_width: usize, model: &dyn DynamicsModel) -> AttuneResult<usize> {
    let meta = model.metadata();
    let needed = meta.state_columns.len().max(meta.target_columns.len());
    if state_width < needed {
        return Err(AttuneError::DimensionMismatch {
            context: "model state",
            expected: needed,
            found: state_width,
        });
    }
    Ok(meta.state_columns.len())
}

/// Advances `state` by one step of `model` under `action`.
///
/// The returned state has one entry per target column. For history models
/// the caller pushes it into the history buffer.
pub fn predict_next(
    model: &dyn DynamicsModel,
    state: &State,
    action: &Action,
) -> AttuneResult<StepPrediction> {
    let meta = model.metadata();
    let width = model_input_width(state.len(), model)?;
    let action = expand_action(action, meta.input_columns.len())?;

    let model_state = state.rows(0, width).into_owned();
    let raw = model.predict(&model_state, &action)?;
    if raw.mean.len() != meta.target_columns.len() {
        return Err(AttuneError::DimensionMismatch {
            context: "model prediction",
            expected: meta.target_columns.len(),
            found: raw.mean.len(),
        });
    }

    let mut next_state = state.rows(0, meta.target_columns.len()).into_owned();
    for (i, kind) in meta.target_kinds().into_iter().enumerate() {
        next_state[i] = match kind {
            TargetKind::Delta => state[i] + raw.mean[i],
            TargetKind::Absolute => raw.mean[i],
        };
    }

    Ok(StepPrediction {
        next_state,
        variance: raw.log_variance.map(f64::exp),
    })
}

/// `predict_next` for a batch of states under a batch of actions, computed
/// with a single `predict_batch` call.
pub fn predict_next_batch(
    model: &dyn DynamicsModel,
    states: &StateBatch,
    actions: &ActionBatch,
) -> AttuneResult<BatchStep> {
    if states.nrows() != actions.nrows() {
        return Err(AttuneError::DimensionMismatch {
            context: "batch rows",
            expected: states.nrows(),
            found: actions.nrows(),
        });
    }
    let meta = model.metadata();
    let width = model_input_width(states.ncols(), model)?;
    let actions = expand_action_batch(actions, meta.input_columns.len())?;

    let model_states = states.columns(0, width).into_owned();
    let raw = model.predict_batch(&model_states, &actions)?;
    let n_out = meta.target_columns.len();
    if raw.mean.ncols() != n_out || raw.mean.nrows() != states.nrows() {
        return Err(AttuneError::DimensionMismatch {
            context: "model batch prediction",
            expected: n_out,
            found: raw.mean.ncols(),
        });
    }

    let mut next_states = states.columns(0, n_out).into_owned();
    for (j, kind) in meta.target_kinds().into_iter().enumerate() {
        let predicted = raw.mean.column(j);
        match kind {
            TargetKind::Delta => {
                let mut col = next_states.column_mut(j);
                col += predicted;
            }
            TargetKind::Absolute => next_states.set_column(j, &predicted),
        }
    }

    Ok(BatchStep {
        next_states,
        variance: raw.log_variance.map(f64::exp),
    })
}
