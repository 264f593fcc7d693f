// attune_core/src/cost.rs

use crate::error::{AttuneError, AttuneResult};
use crate::types::{Action, ActionBatch, Cost, State, StateBatch};
use dyn_clone::DynClone;
use nalgebra::DVector;
use std::fmt::Debug;

/// Weight on the squared body rates in the attitude cost.
pub const LAMBDA_OMEGA: f64 = 0.0001;

/// Attitude angles are normalized by this many degrees.
const ANGLE_SCALE_DEG: f64 = 180.0;

// --- COST FUNCTION TRAIT ---
// Maps a (next state, action) pair to a scalar to be minimized.
pub trait CostFunction: DynClone + Debug + Send + Sync {
    /// One cost per row of `next_states`. `actions` has a matching row count.
    fn cost(&self, next_states: &StateBatch, actions: &ActionBatch) -> AttuneResult<DVector<f64>>;

    /// Scores a single pair by treating it as a batch of one.
    fn cost_single(&self, next_state: &State, action: &Action) -> AttuneResult<Cost> {
        let states = StateBatch::from_row_slice(1, next_state.len(), next_state.as_slice());
        let actions = ActionBatch::from_row_slice(1, action.len(), action.as_slice());
        let costs = self.cost(&states, &actions)?;
        Ok(Cost(costs[0]))
    }
}

dyn_clone::clone_trait_object!(CostFunction);

/// Quadratic attitude cost that drives pitch and roll to level and damps the
/// body rates:
///
/// `(pitch/180)² + (roll/180)² + λ·(ωx² + ωy² + ωz²)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeCost {
    pub lambda_omega: f64,
}

impl AttitudeCost {
    pub const PITCH: usize = 0;
    pub const ROLL: usize = 1;
    pub const RATES: [usize; 3] = [3, 4, 5];
    const MIN_STATE_DIM: usize = 6;
}

impl Default for AttitudeCost {
    fn default() -> Self {
        Self {
            lambda_omega: LAMBDA_OMEGA,
        }
    }
}

impl CostFunction for AttitudeCost {
    fn cost(&self, next_states: &StateBatch, actions: &ActionBatch) -> AttuneResult<DVector<f64>> {
        if next_states.ncols() < Self::MIN_STATE_DIM {
            return Err(AttuneError::DimensionMismatch {
                context: "attitude cost state",
                expected: Self::MIN_STATE_DIM,
                found: next_states.ncols(),
            });
        }
        if actions.nrows() != next_states.nrows() {
            return Err(AttuneError::DimensionMismatch {
                context: "attitude cost batch rows",
                expected: next_states.nrows(),
                found: actions.nrows(),
            });
        }

        let costs = next_states.row_iter().map(|s| {
            let pitch = s[(0, Self::PITCH)] / ANGLE_SCALE_DEG;
            let roll = s[(0, Self::ROLL)] / ANGLE_SCALE_DEG;
            let rates: f64 = Self::RATES.iter().map(|&i| s[(0, i)].powi(2)).sum();
            pitch.powi(2) + roll.powi(2) + self.lambda_omega * rates
        });
        Ok(DVector::from_iterator(next_states.nrows(), costs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{dmatrix, dvector, DMatrix};

    #[test]
    fn test_cost_is_zero_at_level_attitude() {
        let c = AttitudeCost::default()
            .cost_single(&State::zeros(9), &dvector![0.0, 0.0, 0.0, 0.0])
            .unwrap();
        assert_eq!(c, Cost(0.0));
    }

    #[test]
    fn test_cost_components() {
        let state = dvector![90.0, -180.0, 42.0, 10.0, 0.0, -10.0];
        let c = AttitudeCost::default()
            .cost_single(&state, &dvector![0.0])
            .unwrap();
        // 0.25 + 1.0 + 1e-4 * 200
        assert_abs_diff_eq!(c.value(), 1.27, epsilon = 1e-12);
    }

    #[test]
    fn test_cost_is_non_negative() {
        let states = dmatrix![
            -5.0, 3.0, 0.0, -1.0, 2.0, -3.0;
            1e3, -1e3, 7.0, 1e2, -1e2, 0.5;
            -0.1, -0.2, -0.3, -0.4, -0.5, -0.6
        ];
        let costs = AttitudeCost::default()
            .cost(&states, &DMatrix::zeros(3, 4))
            .unwrap();
        assert_eq!(costs.len(), 3);
        assert!(costs.iter().all(|&c| c >= 0.0));
    }

    #[test]
    fn test_batch_matches_single() {
        let states = dmatrix![1.0, 2.0, 0.0, 3.0, 4.0, 5.0; -6.0, 0.5, 0.0, 0.0, 1.0, 0.0];
        let actions = DMatrix::zeros(2, 1);
        let cost = AttitudeCost::default();
        let batch = cost.cost(&states, &actions).unwrap();
        for i in 0..2 {
            let single = cost
                .cost_single(&states.row(i).transpose(), &dvector![0.0])
                .unwrap();
            assert_abs_diff_eq!(batch[i], single.value(), epsilon = 1e-15);
        }
    }

    #[test]
    fn test_short_state_is_rejected() {
        let err = AttitudeCost::default()
            .cost_single(&dvector![0.0, 0.0, 0.0], &dvector![0.0])
            .unwrap_err();
        assert!(matches!(err, AttuneError::DimensionMismatch { expected: 6, found: 3, .. }));
    }
}
