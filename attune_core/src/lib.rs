// attune_core/src/lib.rs

// Model-based controller tuning: a shared rollout kernel over learned
// dynamics, used both to score PID gains and to plan with random-shooting MPC.
pub mod candidates;
pub mod cost;
pub mod env;
pub mod error;
pub mod history;
pub mod models;
pub mod mpc;
pub mod objective;
pub mod optimizer;
pub mod policy;
pub mod prelude;
pub mod rollout;
pub mod types;

pub use error::{AttuneError, AttuneResult};
