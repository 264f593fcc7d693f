// attune_sim/src/lib.rs

// This prelude is for convenience for other files WITHIN the attune_sim crate.
pub mod prelude;

pub mod cli;
pub mod error;
// Configuration, data loading, runners and reports.
pub mod harness;

pub use error::{HarnessError, HarnessResult};
