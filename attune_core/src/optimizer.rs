// attune_core/src/optimizer.rs

//! Black-box minimization over a box-bounded parameter space.
//!
//! The optimizer only sees an [`Objective`]: it proposes parameter vectors
//! inside the bounds, observes scalar values, and reports every evaluation
//! it made along with the best one.

use crate::error::{AttuneError, AttuneResult};
use crate::objective::Objective;
use crate::policy::{partition_gains, GainLayout, PidChannel, PidGains};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Per-dimension search interval. Both ends are finite and
/// `min[i] <= max[i]` for every dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterBounds {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl ParameterBounds {
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> AttuneResult<Self> {
        if min.len() != max.len() {
            return Err(AttuneError::InvalidBounds(format!(
                "{} lower bounds but {} upper bounds",
                min.len(),
                max.len()
            )));
        }
        if min.is_empty() {
            return Err(AttuneError::InvalidBounds("no dimensions".into()));
        }
        for (i, (lo, hi)) in min.iter().zip(&max).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(AttuneError::InvalidBounds(format!(
                    "dimension {i}: bounds [{lo}, {hi}] are not finite"
                )));
            }
            if lo > hi {
                return Err(AttuneError::InvalidBounds(format!(
                    "dimension {i}: lower bound {lo} exceeds upper bound {hi}"
                )));
            }
        }
        Ok(Self { min, max })
    }

    /// Repeats one controller's bounds for each of `num_pids` controllers.
    pub fn per_controller(min: &[f64], max: &[f64], num_pids: usize) -> AttuneResult<Self> {
        Self::new(min.repeat(num_pids), max.repeat(num_pids))
    }

    pub fn dimension(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self) -> &[f64] {
        &self.min
    }

    pub fn max(&self) -> &[f64] {
        &self.max
    }

    pub fn contains(&self, params: &[f64]) -> bool {
        params.len() == self.dimension()
            && params
                .iter()
                .zip(self.min.iter().zip(&self.max))
                .all(|(p, (lo, hi))| lo <= p && p <= hi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopCriteria {
    pub max_evals: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub parameters: Vec<f64>,
    pub objective: f64,
}

/// Every evaluation an optimizer made, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizationLog {
    pub evaluations: Vec<Evaluation>,
}

impl OptimizationLog {
    pub fn push(&mut self, parameters: Vec<f64>, objective: f64) {
        self.evaluations.push(Evaluation {
            parameters,
            objective,
        });
    }

    pub fn n_evals(&self) -> usize {
        self.evaluations.len()
    }

    pub fn objectives(&self) -> Vec<f64> {
        self.evaluations.iter().map(|e| e.objective).collect()
    }

    /// The lowest finite objective seen. Ties keep the earliest evaluation.
    pub fn best(&self) -> Option<&Evaluation> {
        self.evaluations
            .iter()
            .filter(|e| e.objective.is_finite())
            .fold(None, |best: Option<&Evaluation>, e| match best {
                Some(b) if b.objective <= e.objective => Some(b),
                _ => Some(e),
            })
    }

    pub fn best_parameters(&self) -> Option<&[f64]> {
        self.best().map(|e| e.parameters.as_slice())
    }

    pub fn best_objective(&self) -> Option<f64> {
        self.best().map(|e| e.objective)
    }

    /// Best objective after each evaluation. Non-finite values never become
    /// the running best.
    pub fn running_best(&self) -> Vec<f64> {
        let mut best = f64::INFINITY;
        self.evaluations
            .iter()
            .map(|e| {
                if e.objective.is_finite() && e.objective < best {
                    best = e.objective;
                }
                best
            })
            .collect()
    }
}

// --- OPTIMIZER TRAIT ---
pub trait BlackBoxOptimizer {
    fn optimize(
        &mut self,
        objective: &mut dyn Objective,
        bounds: &ParameterBounds,
        stop: StopCriteria,
    ) -> AttuneResult<OptimizationLog>;
}

/// Uniform random search inside the bounds. Every proposal is independent.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    rng: ChaCha8Rng,
}

impl RandomSearch {
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self { rng }
    }

    fn propose<R: Rng>(dists: &[Uniform<f64>], rng: &mut R) -> Vec<f64> {
        dists.iter().map(|d| d.sample(rng)).collect()
    }
}

impl BlackBoxOptimizer for RandomSearch {
    fn optimize(
        &mut self,
        objective: &mut dyn Objective,
        bounds: &ParameterBounds,
        stop: StopCriteria,
    ) -> AttuneResult<OptimizationLog> {
        if objective.dimension() != bounds.dimension() {
            return Err(AttuneError::DimensionMismatch {
                context: "optimizer bounds",
                expected: objective.dimension(),
                found: bounds.dimension(),
            });
        }
        let dists: Vec<Uniform<f64>> = bounds
            .min()
            .iter()
            .zip(bounds.max())
            .map(|(&lo, &hi)| Uniform::new_inclusive(lo, hi))
            .collect();

        let mut log = OptimizationLog::default();
        for i in 0..stop.max_evals {
            let params = Self::propose(&dists, &mut self.rng);
            let value = objective.evaluate(&params)?;
            debug!(iteration = i, objective = value, "random search evaluation");
            log.push(params, value);
        }
        if let Some(best) = log.best_objective() {
            info!(evals = log.n_evals(), best, "random search finished");
        }
        Ok(log)
    }
}

/// Tuned gains of one named controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelGains {
    pub name: String,
    pub gains: PidGains,
}

/// Outcome of a tuning run, with the best parameters mapped back onto the
/// controllers they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningReport {
    pub best_objective: f64,
    pub best_parameters: Vec<f64>,
    pub channels: Vec<ChannelGains>,
    pub log: OptimizationLog,
}

impl TuningReport {
    /// Returns `None` when the log holds no finite evaluation.
    pub fn from_log(
        log: OptimizationLog,
        channels: &[PidChannel],
        layout: GainLayout,
    ) -> AttuneResult<Option<Self>> {
        let Some(best) = log.best().cloned() else {
            return Ok(None);
        };
        let gains = partition_gains(&best.parameters, channels.len(), layout)?;
        let channels = channels
            .iter()
            .zip(gains)
            .map(|(c, gains)| ChannelGains {
                name: c.name.clone(),
                gains,
            })
            .collect();
        Ok(Some(Self {
            best_objective: best.objective,
            best_parameters: best.parameters,
            channels,
            log,
        }))
    }
}
