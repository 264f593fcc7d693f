// attune_sim/src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Attune: model-based tuning of quadrotor attitude controllers.
///
/// Every command loads the experiment file, resolves its prefab references
/// against the catalog, loads the learned model and the logged flight data,
/// then runs.
#[derive(Parser, Debug, Clone)]
#[command(name = "attune", author, version, about, long_about = None)]
pub struct Cli {
    /// The experiment TOML file.
    #[arg(short, long, default_value = "conf/experiment.toml")]
    pub config: PathBuf,

    /// Directory of prefab TOML files referenced with `from = "..."`.
    #[arg(long, default_value = "conf/catalog")]
    pub catalog: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Search PID gains that minimize the model-predicted attitude cost.
    Tune,

    /// Score one gain vector over the evaluation set.
    Rollout {
        /// Flat gains in controller order, e.g. `kp_pitch,kd_pitch,kp_roll,kd_roll`.
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        gains: Vec<f64>,
    },

    /// Fly the random-shooting MPC policy against the learned model.
    Mpc {
        /// Closed-loop steps. Defaults to `mpc.steps` from the config.
        #[arg(long)]
        steps: Option<usize>,
    },
}
