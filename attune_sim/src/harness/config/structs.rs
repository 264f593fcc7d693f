// attune_sim/src/harness/config/structs.rs

use attune_core::env::ActionSpace;
use attune_core::mpc::MpcConfig;
use attune_core::optimizer::{ParameterBounds, StopCriteria};
use attune_core::policy::{quad_plus_mixer, GainLayout, PidChannel, PidPolicy};
use attune_core::rollout::{RolloutConfig, DEFAULT_DISCOUNT};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{HarnessError, HarnessResult};

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # ExperimentConfig
/// The root of the data parsed from an experiment TOML file, after every
/// `from = "..."` prefab reference has been resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub experiment: ExperimentSection,

    pub data: DataConfig,

    #[serde(default)]
    pub bo: BoConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub mpc: MpcSection,
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentSection {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    /// Where reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for ExperimentSection {
    fn default() -> Self {
        Self {
            seed: None,
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// TOML-serialized linear dynamics model.
    pub model_file: PathBuf,
    /// Logged flight data with a header row.
    pub trajectory_csv: PathBuf,
    /// Rows with |pitch| at or above this are not used as initial states.
    #[serde(default = "default_max_abs_angle")]
    pub max_abs_pitch: f64,
    #[serde(default = "default_max_abs_angle")]
    pub max_abs_roll: f64,
}

fn default_max_abs_angle() -> f64 {
    10.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoConfig {
    /// Objective evaluations the optimizer may spend.
    pub iterations: usize,
    /// Rollout horizon.
    pub max_length: usize,
    pub discount: f64,
}

impl Default for BoConfig {
    fn default() -> Self {
        Self {
            iterations: 20,
            max_length: 100,
            discount: DEFAULT_DISCOUNT,
        }
    }
}

impl BoConfig {
    pub fn rollout(&self) -> HarnessResult<RolloutConfig> {
        Ok(RolloutConfig::new(self.max_length, self.discount)?)
    }

    pub fn stop_criteria(&self) -> StopCriteria {
        StopCriteria {
            max_evals: self.iterations,
        }
    }
}

/// Which loop of the attitude stack the PIDs close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PidMode {
    /// Regulate the Euler angles (state indices 0, 1, 2).
    #[default]
    Euler,
    /// Regulate the body rates (state indices 3, 4, 5).
    Rate,
}

impl PidMode {
    /// Default pitch and roll channels for this mode.
    pub fn default_channels(self) -> Vec<PidChannel> {
        let offset = match self {
            PidMode::Euler => 0,
            PidMode::Rate => 3,
        };
        ["pitch", "roll"]
            .iter()
            .enumerate()
            .map(|(i, name)| PidChannel {
                name: (*name).to_string(),
                state_index: offset + i,
                setpoint: 0.0,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GainBounds {
    pub min_values: Vec<f64>,
    pub max_values: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PidSection {
    /// Bounds of one controller's free gains, repeated for every controller.
    pub params: GainBounds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    #[serde(default)]
    pub mode: PidMode,
    /// Explicit channels. When empty, the mode's pitch and roll channels are used.
    #[serde(default)]
    pub channels: Vec<PidChannel>,
    #[serde(default)]
    pub layout: GainLayout,
    /// Action the mixer adds the controller outputs to (e.g. hover thrust).
    pub equilibrium: Vec<f64>,
    /// Rows of an (action_dim × channels) mixing matrix. Defaults to the
    /// four-motor plus mixer.
    #[serde(default)]
    pub mixer: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub action_low: Option<Vec<f64>>,
    #[serde(default)]
    pub action_high: Option<Vec<f64>>,
    #[serde(default)]
    pub integral_limit: Option<f64>,
    #[serde(default)]
    pub pid: PidSection,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            mode: PidMode::default(),
            channels: Vec::new(),
            layout: GainLayout::default(),
            equilibrium: vec![0.0; 4],
            mixer: None,
            action_low: None,
            action_high: None,
            integral_limit: None,
            pid: PidSection {
                params: GainBounds {
                    min_values: vec![0.0, 0.0],
                    max_values: vec![1.0, 1.0],
                },
            },
        }
    }
}

impl PolicyConfig {
    pub fn resolved_channels(&self) -> Vec<PidChannel> {
        if self.channels.is_empty() {
            self.mode.default_channels()
        } else {
            self.channels.clone()
        }
    }

    fn mixer_matrix(&self, channels: &[PidChannel]) -> HarnessResult<DMatrix<f64>> {
        let Some(rows) = &self.mixer else {
            return Ok(quad_plus_mixer(channels)?);
        };
        let ncols = channels.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != ncols) {
            return Err(HarnessError::InvalidSetting(format!(
                "policy.mixer rows must have {ncols} entries, found {}",
                bad.len()
            )));
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Ok(DMatrix::from_row_slice(rows.len(), ncols, &flat))
    }

    pub fn action_limits(&self) -> HarnessResult<Option<ActionSpace>> {
        match (&self.action_low, &self.action_high) {
            (Some(low), Some(high)) => Ok(Some(ActionSpace::new(
                DVector::from_column_slice(low),
                DVector::from_column_slice(high),
            )?)),
            (None, None) => Ok(None),
            _ => Err(HarnessError::InvalidSetting(
                "policy.action_low and policy.action_high must be set together".into(),
            )),
        }
    }

    /// Builds the PID policy with zero gains.
    pub fn build_policy(&self) -> HarnessResult<PidPolicy> {
        let channels = self.resolved_channels();
        let mixer = self.mixer_matrix(&channels)?;
        let mut policy = PidPolicy::new(
            channels,
            self.layout,
            mixer,
            DVector::from_column_slice(&self.equilibrium),
        )?;
        if let Some(limits) = self.action_limits()? {
            policy = policy.with_action_limits(limits)?;
        }
        if let Some(limit) = self.integral_limit {
            policy = policy.with_integral_limit(limit);
        }
        Ok(policy)
    }

    pub fn bounds(&self, num_pids: usize) -> HarnessResult<ParameterBounds> {
        Ok(ParameterBounds::per_controller(
            &self.pid.params.min_values,
            &self.pid.params.max_values,
            num_pids,
        )?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MpcSection {
    /// Candidate sequences per planning call.
    pub n: usize,
    /// Planning horizon.
    pub t: usize,
    #[serde(default)]
    pub hold: bool,
    pub action_low: Vec<f64>,
    pub action_high: Vec<f64>,
    /// Closed-loop steps of the `mpc` command.
    pub steps: usize,
}

impl Default for MpcSection {
    fn default() -> Self {
        Self {
            n: 500,
            t: 10,
            hold: false,
            action_low: vec![0.0; 4],
            action_high: vec![65535.0; 4],
            steps: 50,
        }
    }
}

impl MpcSection {
    pub fn mpc_config(&self) -> MpcConfig {
        MpcConfig {
            n_candidates: self.n,
            horizon: self.t,
            hold: self.hold,
        }
    }

    pub fn action_space(&self) -> HarnessResult<ActionSpace> {
        Ok(ActionSpace::new(
            DVector::from_column_slice(&self.action_low),
            DVector::from_column_slice(&self.action_high),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selects_default_channels() {
        let euler = PidMode::Euler.default_channels();
        assert_eq!(euler[0].state_index, 0);
        assert_eq!(euler[1].name, "roll");
        let rate = PidMode::Rate.default_channels();
        assert_eq!(rate[0].state_index, 3);
        assert_eq!(rate[1].state_index, 4);
    }

    #[test]
    fn test_default_policy_builds() {
        let cfg = PolicyConfig::default();
        let policy = cfg.build_policy().unwrap();
        assert_eq!(policy.num_pids(), 2);
        assert_eq!(policy.num_parameters(), 4);
        let bounds = cfg.bounds(policy.num_pids()).unwrap();
        assert_eq!(bounds.dimension(), 4);
    }

    #[test]
    fn test_explicit_mixer_shape_is_checked() {
        let cfg = PolicyConfig {
            mixer: Some(vec![vec![1.0, 0.0], vec![0.0]]),
            ..PolicyConfig::default()
        };
        assert!(matches!(
            cfg.build_policy().unwrap_err(),
            HarnessError::InvalidSetting(_)
        ));
    }

    #[test]
    fn test_half_specified_action_limits_are_rejected() {
        let cfg = PolicyConfig {
            action_low: Some(vec![0.0; 4]),
            ..PolicyConfig::default()
        };
        assert!(cfg.action_limits().is_err());
    }
}
