// attune_core/src/policy/pid.rs

//! PID attitude stack.
//!
//! Each channel runs an independent PID on one state variable towards a
//! setpoint. The channel outputs are mixed into motor commands around an
//! equilibrium action, the way a quadrotor firmware mixes its attitude
//! controller outputs:
//!
//! ```text
//! m1 = thrust + pitch + yaw
//! m2 = thrust - roll  - yaw
//! m3 = thrust - pitch + yaw
//! m4 = thrust + roll  - yaw
//! ```

use super::Policy;
use crate::env::ActionSpace;
use crate::error::{AttuneError, AttuneResult};
use crate::types::{Action, State};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

/// Which gains of each controller are free parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GainLayout {
    /// `[kp, kd]` per controller, the integral gain is held at zero.
    #[default]
    ProportionalDerivative,
    /// `[kp, ki, kd]` per controller.
    Full,
}

impl GainLayout {
    /// Number of free parameters per controller.
    pub fn width(self) -> usize {
        self.labels().len()
    }

    pub fn labels(self) -> &'static [&'static str] {
        match self {
            GainLayout::ProportionalDerivative => &["kp", "kd"],
            GainLayout::Full => &["kp", "ki", "kd"],
        }
    }

    fn gains_from(self, chunk: &[f64]) -> PidGains {
        match self {
            GainLayout::ProportionalDerivative => PidGains::new(chunk[0], 0.0, chunk[1]),
            GainLayout::Full => PidGains::new(chunk[0], chunk[1], chunk[2]),
        }
    }

    /// The free parameters of `gains`, in layout order.
    pub fn flatten(self, gains: &[PidGains]) -> Vec<f64> {
        gains
            .iter()
            .flat_map(|g| match self {
                GainLayout::ProportionalDerivative => vec![g.kp, g.kd],
                GainLayout::Full => vec![g.kp, g.ki, g.kd],
            })
            .collect()
    }
}

/// Splits a flat parameter vector into one gain set per controller.
///
/// The vector must divide evenly across `num_pids` controllers, and each
/// share must match the width of `layout`.
pub fn partition_gains(
    params: &[f64],
    num_pids: usize,
    layout: GainLayout,
) -> AttuneResult<Vec<PidGains>> {
    let partition_error = AttuneError::Partition {
        parameters: params.len(),
        controllers: num_pids,
    };
    if num_pids == 0 || params.len() % num_pids != 0 {
        return Err(partition_error);
    }
    let per_pid = params.len() / num_pids;
    if per_pid != layout.width() {
        return Err(partition_error);
    }
    Ok(params
        .chunks(per_pid)
        .map(|chunk| layout.gains_from(chunk))
        .collect())
}

/// A discrete PID on a scalar error signal.
#[derive(Debug, Clone)]
pub struct PidController {
    pub gains: PidGains,
    /// Anti-windup clamp on the accumulated error.
    pub integral_limit: Option<f64>,
    err_sum: f64,
    last_err: f64,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        PidController {
            gains,
            integral_limit: None,
            err_sum: 0.0,
            last_err: 0.0,
        }
    }

    /// One PID step. Returns control output.
    pub fn step(&mut self, error: f64) -> f64 {
        self.err_sum += error;
        if let Some(limit) = self.integral_limit {
            self.err_sum = self.err_sum.clamp(-limit, limit);
        }
        let d_err = error - self.last_err;
        self.last_err = error;
        self.gains.kp * error + self.gains.ki * self.err_sum + self.gains.kd * d_err
    }

    /// Reset accumulated state.
    pub fn reset(&mut self) {
        self.err_sum = 0.0;
        self.last_err = 0.0;
    }
}

/// Binds one controller to the state variable it regulates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidChannel {
    /// e.g. "pitch", "roll", "yaw".
    pub name: String,
    /// Index of the regulated variable in the state vector.
    pub state_index: usize,
    #[serde(default)]
    pub setpoint: f64,
}

/// Mixer for a four-motor plus-configuration craft. Columns follow
/// `channels`; each channel name must be `pitch`, `roll`, or `yaw`.
pub fn quad_plus_mixer(channels: &[PidChannel]) -> AttuneResult<DMatrix<f64>> {
    let mut mixer = DMatrix::zeros(4, channels.len());
    for (j, channel) in channels.iter().enumerate() {
        let column = match channel.name.as_str() {
            "pitch" => [1.0, 0.0, -1.0, 0.0],
            "roll" => [0.0, -1.0, 0.0, 1.0],
            "yaw" => [1.0, -1.0, 1.0, -1.0],
            other => return Err(AttuneError::UnknownChannel(other.to_string())),
        };
        mixer.set_column(j, &DVector::from_row_slice(&column));
    }
    Ok(mixer)
}

/// A bank of independent PID controllers mixed into one action vector.
#[derive(Debug, Clone)]
pub struct PidPolicy {
    channels: Vec<PidChannel>,
    controllers: Vec<PidController>,
    layout: GainLayout,
    /// (action_dim × channels)
    mixer: DMatrix<f64>,
    equilibrium: Action,
    action_limits: Option<ActionSpace>,
}

impl PidPolicy {
    /// Creates a policy with all gains at zero. Call `set_params` before use.
    pub fn new(
        channels: Vec<PidChannel>,
        layout: GainLayout,
        mixer: DMatrix<f64>,
        equilibrium: Action,
    ) -> AttuneResult<Self> {
        if channels.is_empty() {
            return Err(AttuneError::Partition {
                parameters: 0,
                controllers: 0,
            });
        }
        if mixer.ncols() != channels.len() {
            return Err(AttuneError::DimensionMismatch {
                context: "PID mixer columns",
                expected: channels.len(),
                found: mixer.ncols(),
            });
        }
        if mixer.nrows() != equilibrium.len() {
            return Err(AttuneError::DimensionMismatch {
                context: "PID mixer rows",
                expected: equilibrium.len(),
                found: mixer.nrows(),
            });
        }
        let controllers = channels
            .iter()
            .map(|_| PidController::new(PidGains::default()))
            .collect();
        Ok(Self {
            channels,
            controllers,
            layout,
            mixer,
            equilibrium,
            action_limits: None,
        })
    }

    /// Clips every action into `limits`.
    pub fn with_action_limits(mut self, limits: ActionSpace) -> AttuneResult<Self> {
        if limits.dim() != self.equilibrium.len() {
            return Err(AttuneError::DimensionMismatch {
                context: "PID action limits",
                expected: self.equilibrium.len(),
                found: limits.dim(),
            });
        }
        self.action_limits = Some(limits);
        Ok(self)
    }

    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        for c in &mut self.controllers {
            c.integral_limit = Some(limit);
        }
        self
    }

    pub fn num_pids(&self) -> usize {
        self.controllers.len()
    }

    /// Free parameters across all controllers.
    pub fn num_parameters(&self) -> usize {
        self.layout.width() * self.num_pids()
    }

    pub fn layout(&self) -> GainLayout {
        self.layout
    }

    pub fn channels(&self) -> &[PidChannel] {
        &self.channels
    }

    pub fn gains(&self) -> Vec<PidGains> {
        self.controllers.iter().map(|c| c.gains).collect()
    }

    /// Installs one gain set per controller, in channel order.
    pub fn set_params(&mut self, param_sets: &[PidGains]) -> AttuneResult<()> {
        if param_sets.len() != self.controllers.len() {
            return Err(AttuneError::DimensionMismatch {
                context: "PID parameter sets",
                expected: self.controllers.len(),
                found: param_sets.len(),
            });
        }
        for (controller, gains) in self.controllers.iter_mut().zip(param_sets) {
            controller.gains = *gains;
        }
        Ok(())
    }
}

impl Policy for PidPolicy {
    fn get_action(&mut self, state: &State) -> AttuneResult<Action> {
        let mut u = DVector::zeros(self.controllers.len());
        for (i, (channel, controller)) in self
            .channels
            .iter()
            .zip(self.controllers.iter_mut())
            .enumerate()
        {
            if channel.state_index >= state.len() {
                return Err(AttuneError::DimensionMismatch {
                    context: "PID channel state index",
                    expected: channel.state_index + 1,
                    found: state.len(),
                });
            }
            u[i] = controller.step(channel.setpoint - state[channel.state_index]);
        }

        let action = &self.equilibrium + &self.mixer * u;
        Ok(match &self.action_limits {
            Some(limits) => limits.clip(&action),
            None => action,
        })
    }

    fn reset(&mut self) {
        for c in &mut self.controllers {
            c.reset();
        }
    }
}
