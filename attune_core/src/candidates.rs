// attune_core/src/candidates.rs

use crate::env::ActionSpace;
use crate::error::{AttuneError, AttuneResult};
use crate::types::{Action, ActionBatch};
use nalgebra::DMatrix;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// A (candidates × horizon × action_dim) set of action sequences.
///
/// Stored time-major: `steps[t]` is a (candidates × action_dim) matrix, so a
/// single time step of every candidate is one contiguous batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateBatch {
    steps: Vec<ActionBatch>,
}

impl CandidateBatch {
    pub fn from_steps(steps: Vec<ActionBatch>) -> AttuneResult<Self> {
        let Some(first) = steps.first() else {
            return Err(AttuneError::InvalidHorizon(0));
        };
        if first.nrows() == 0 {
            return Err(AttuneError::InvalidCandidateCount);
        }
        let shape = first.shape();
        if let Some(bad) = steps.iter().find(|s| s.shape() != shape) {
            return Err(AttuneError::DimensionMismatch {
                context: "candidate step shape",
                expected: shape.0 * shape.1,
                found: bad.nrows() * bad.ncols(),
            });
        }
        Ok(Self { steps })
    }

    pub fn num_candidates(&self) -> usize {
        self.steps[0].nrows()
    }

    pub fn horizon(&self) -> usize {
        self.steps.len()
    }

    pub fn action_dim(&self) -> usize {
        self.steps[0].ncols()
    }

    /// The `t`-th action of every candidate.
    pub fn step(&self, t: usize) -> &ActionBatch {
        &self.steps[t]
    }

    /// The full action sequence of candidate `i` as a (horizon × action_dim)
    /// matrix.
    pub fn sequence(&self, i: usize) -> DMatrix<f64> {
        DMatrix::from_fn(self.horizon(), self.action_dim(), |t, j| self.steps[t][(i, j)])
    }

    /// The action candidate `i` would execute first.
    pub fn first_action(&self, i: usize) -> Action {
        self.steps[0].row(i).transpose()
    }
}

/// Uniform sampler over an action space, one independent distribution per
/// action dimension.
#[derive(Debug, Clone)]
pub struct ActionSampler {
    dims: Vec<Uniform<f64>>,
}

impl ActionSampler {
    pub fn new(space: &ActionSpace) -> Self {
        let dims = space
            .low()
            .iter()
            .zip(space.high().iter())
            .map(|(&lo, &hi)| Uniform::new_inclusive(lo, hi))
            .collect();
        Self { dims }
    }

    pub fn action_dim(&self) -> usize {
        self.dims.len()
    }

    fn sample_batch<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> ActionBatch {
        let mut batch = ActionBatch::zeros(n, self.dims.len());
        for i in 0..n {
            for (j, dist) in self.dims.iter().enumerate() {
                batch[(i, j)] = dist.sample(rng);
            }
        }
        batch
    }

    /// Draws `n` action sequences of length `horizon`. With `hold`, each
    /// candidate draws one action and repeats it for the whole horizon.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        n: usize,
        horizon: usize,
        hold: bool,
        rng: &mut R,
    ) -> AttuneResult<CandidateBatch> {
        if n == 0 {
            return Err(AttuneError::InvalidCandidateCount);
        }
        if horizon == 0 {
            return Err(AttuneError::InvalidHorizon(horizon));
        }
        let steps = if hold {
            let held = self.sample_batch(n, rng);
            vec![held; horizon]
        } else {
            (0..horizon).map(|_| self.sample_batch(n, rng)).collect()
        };
        CandidateBatch::from_steps(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn space() -> ActionSpace {
        ActionSpace::new(dvector![0.0, -1.0, 10.0], dvector![1.0, 1.0, 20.0]).unwrap()
    }

    #[test]
    fn test_samples_stay_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let space = space();
        let batch = ActionSampler::new(&space).sample(50, 4, false, &mut rng).unwrap();
        assert_eq!(batch.num_candidates(), 50);
        assert_eq!(batch.horizon(), 4);
        assert_eq!(batch.action_dim(), 3);
        for t in 0..batch.horizon() {
            for row in batch.step(t).row_iter() {
                for j in 0..3 {
                    assert!(row[(0, j)] >= space.low()[j] && row[(0, j)] <= space.high()[j]);
                }
            }
        }
    }

    #[test]
    fn test_hold_repeats_one_action_per_candidate() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let batch = ActionSampler::new(&space()).sample(5, 6, true, &mut rng).unwrap();
        for i in 0..5 {
            let seq = batch.sequence(i);
            for t in 1..6 {
                assert_eq!(seq.row(t), seq.row(0));
            }
        }
    }

    #[test]
    fn test_same_seed_same_candidates() {
        let sampler = ActionSampler::new(&space());
        let a = sampler
            .sample(8, 3, false, &mut ChaCha8Rng::seed_from_u64(11))
            .unwrap();
        let b = sampler
            .sample(8, 3, false, &mut ChaCha8Rng::seed_from_u64(11))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate_requests_fail() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let sampler = ActionSampler::new(&space());
        assert_eq!(
            sampler.sample(0, 3, false, &mut rng).unwrap_err(),
            AttuneError::InvalidCandidateCount
        );
        assert_eq!(
            sampler.sample(3, 0, false, &mut rng).unwrap_err(),
            AttuneError::InvalidHorizon(0)
        );
    }

    #[test]
    fn test_first_action_and_sequence() {
        let batch = CandidateBatch::from_steps(vec![
            DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]),
            DMatrix::from_row_slice(2, 2, &[5.0, 6.0, 7.0, 8.0]),
        ])
        .unwrap();
        assert_eq!(batch.first_action(1), dvector![3.0, 4.0]);
        assert_eq!(
            batch.sequence(0),
            DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 5.0, 6.0])
        );
    }
}
