// attune_core/src/models/linear.rs

use super::{BatchPrediction, DynamicsModel, ModelMetadata, Prediction};
use crate::error::{AttuneError, AttuneResult};
use crate::types::{Action, ActionBatch, State, StateBatch};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// The on-disk form of a trained linear forward model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModelFile {
    #[serde(flatten)]
    pub metadata: ModelMetadata,
    /// One row per target, one column per state column followed by one per
    /// input column.
    pub weights: Vec<Vec<f64>>,
    /// One entry per target.
    pub bias: Vec<f64>,
    /// Learned log-variance, one entry per target.
    #[serde(default)]
    pub log_variance: Vec<f64>,
}

// --- Linear Forward Model ---
// prediction = W · [state; action] + b
#[derive(Debug, Clone)]
pub struct LinearModel {
    metadata: ModelMetadata,
    /// (targets × (states + inputs))
    weights: DMatrix<f64>,
    bias: DVector<f64>,
    log_variance: DVector<f64>,
}

impl LinearModel {
    pub fn new(
        metadata: ModelMetadata,
        weights: DMatrix<f64>,
        bias: DVector<f64>,
        log_variance: DVector<f64>,
    ) -> AttuneResult<Self> {
        let n_out = metadata.target_columns.len();
        let n_in = metadata.state_columns.len() + metadata.input_columns.len();
        if weights.nrows() != n_out {
            return Err(AttuneError::DimensionMismatch {
                context: "linear model weight rows",
                expected: n_out,
                found: weights.nrows(),
            });
        }
        if weights.ncols() != n_in {
            return Err(AttuneError::DimensionMismatch {
                context: "linear model weight columns",
                expected: n_in,
                found: weights.ncols(),
            });
        }
        for (context, len) in [
            ("linear model bias", bias.len()),
            ("linear model log-variance", log_variance.len()),
        ] {
            if len != n_out {
                return Err(AttuneError::DimensionMismatch {
                    context,
                    expected: n_out,
                    found: len,
                });
            }
        }
        Ok(Self {
            metadata,
            weights,
            bias,
            log_variance,
        })
    }

    /// Builds a model from its deserialized file. A missing log-variance
    /// defaults to zero (unit variance).
    pub fn from_file(file: LinearModelFile) -> AttuneResult<Self> {
        let n_out = file.metadata.target_columns.len();
        let n_in = file.metadata.state_columns.len() + file.metadata.input_columns.len();
        if let Some(bad) = file.weights.iter().find(|row| row.len() != n_in) {
            return Err(AttuneError::DimensionMismatch {
                context: "linear model weight columns",
                expected: n_in,
                found: bad.len(),
            });
        }
        let weights = DMatrix::from_row_iterator(
            file.weights.len(),
            n_in,
            file.weights.iter().flatten().copied(),
        );
        let log_variance = if file.log_variance.is_empty() {
            DVector::zeros(n_out)
        } else {
            DVector::from_vec(file.log_variance)
        };
        Self::new(file.metadata, weights, DVector::from_vec(file.bias), log_variance)
    }

    fn check_inputs(&self, state_width: usize, action_width: usize) -> AttuneResult<()> {
        if state_width != self.metadata.state_columns.len() {
            return Err(AttuneError::DimensionMismatch {
                context: "linear model state",
                expected: self.metadata.state_columns.len(),
                found: state_width,
            });
        }
        if action_width != self.metadata.input_columns.len() {
            return Err(AttuneError::DimensionMismatch {
                context: "linear model action",
                expected: self.metadata.input_columns.len(),
                found: action_width,
            });
        }
        Ok(())
    }
}

impl DynamicsModel for LinearModel {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn predict(&self, state: &State, action: &Action) -> AttuneResult<Prediction> {
        self.check_inputs(state.len(), action.len())?;
        let n_s = state.len();
        let w_state = self.weights.columns(0, n_s);
        let w_action = self.weights.columns(n_s, action.len());
        let mean = w_state * state + w_action * action + &self.bias;
        Ok(Prediction {
            mean,
            log_variance: self.log_variance.clone(),
        })
    }

    // The whole batch is one product: X · Wᵀ + 1 · bᵀ.
    fn predict_batch(
        &self,
        states: &StateBatch,
        actions: &ActionBatch,
    ) -> AttuneResult<BatchPrediction> {
        self.check_inputs(states.ncols(), actions.ncols())?;
        if states.nrows() != actions.nrows() {
            return Err(AttuneError::DimensionMismatch {
                context: "linear model batch rows",
                expected: states.nrows(),
                found: actions.nrows(),
            });
        }
        let n = states.nrows();
        let n_s = states.ncols();
        let mut inputs = DMatrix::<f64>::zeros(n, n_s + actions.ncols());
        inputs.columns_mut(0, n_s).copy_from(states);
        inputs.columns_mut(n_s, actions.ncols()).copy_from(actions);

        let mut mean = inputs * self.weights.transpose();
        for mut row in mean.row_iter_mut() {
            row += self.bias.transpose();
        }
        let log_variance = DMatrix::from_fn(n, self.log_variance.len(), |_, j| self.log_variance[j]);
        Ok(BatchPrediction { mean, log_variance })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{dmatrix, dvector};

    fn metadata() -> ModelMetadata {
        ModelMetadata {
            state_columns: vec!["pitch".into(), "roll".into()],
            input_columns: vec!["m1".into()],
            target_columns: vec!["pitch_dx".into(), "roll_dx".into()],
        }
    }

    fn model() -> LinearModel {
        LinearModel::new(
            metadata(),
            dmatrix![0.5, 0.0, 1.0; 0.0, -1.0, 2.0],
            dvector![0.1, 0.2],
            dvector![-1.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_single_prediction() {
        let p = model().predict(&dvector![2.0, 1.0], &dvector![3.0]).unwrap();
        assert_abs_diff_eq!(p.mean[0], 0.5 * 2.0 + 3.0 + 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(p.mean[1], -1.0 + 6.0 + 0.2, epsilon = 1e-12);
        assert_eq!(p.log_variance, dvector![-1.0, 0.0]);
    }

    #[test]
    fn test_batch_prediction_matches_single() {
        let m = model();
        let states = dmatrix![2.0, 1.0; -1.0, 4.0; 0.0, 0.0];
        let actions = dmatrix![3.0; 0.5; -2.0];
        let batch = m.predict_batch(&states, &actions).unwrap();
        for i in 0..3 {
            let single = m
                .predict(&states.row(i).transpose(), &actions.row(i).transpose())
                .unwrap();
            for j in 0..2 {
                assert_abs_diff_eq!(batch.mean[(i, j)], single.mean[j], epsilon = 1e-12);
                assert_abs_diff_eq!(batch.log_variance[(i, j)], single.log_variance[j]);
            }
        }
    }

    #[test]
    fn test_wrong_input_width_is_rejected() {
        let err = model().predict(&dvector![1.0], &dvector![0.0]).unwrap_err();
        assert!(matches!(err, AttuneError::DimensionMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_from_file_validates_shapes() {
        let file = LinearModelFile {
            metadata: metadata(),
            weights: vec![vec![0.5, 0.0, 1.0], vec![0.0, -1.0]],
            bias: vec![0.0, 0.0],
            log_variance: Vec::new(),
        };
        assert!(LinearModel::from_file(file).is_err());

        let file = LinearModelFile {
            metadata: metadata(),
            weights: vec![vec![0.5, 0.0, 1.0], vec![0.0, -1.0, 2.0]],
            bias: vec![0.1, 0.2],
            log_variance: Vec::new(),
        };
        let m = LinearModel::from_file(file).unwrap();
        let p = m.predict(&dvector![2.0, 1.0], &dvector![3.0]).unwrap();
        assert_abs_diff_eq!(p.mean[1], 5.2, epsilon = 1e-12);
        assert_eq!(p.log_variance, dvector![0.0, 0.0]);
    }
}
