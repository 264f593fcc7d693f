// attune_sim/src/prelude.rs

// Re-export the entire attune_core prelude so you can easily access
// pure types like `State`, `DynamicsModel`, `PidPolicy`, etc.
pub use attune_core::prelude::*;

// Re-export common harness types for easy access.
pub use crate::error::{HarnessError, HarnessResult};
pub use crate::harness::config::structs::*;
pub use crate::harness::config::{load_experiment, PrefabCatalog};
pub use crate::harness::core::context::ExperimentContext;
pub use crate::harness::core::prng::ExperimentRng;
pub use crate::harness::report::{MpcStepRecord, ReportDir};
pub use crate::harness::runners::{run_mpc, run_rollout, run_tune};
