// attune_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::cost::CostFunction;
pub use crate::env::Environment;
pub use crate::models::DynamicsModel;
pub use crate::objective::Objective;
pub use crate::optimizer::BlackBoxOptimizer;
pub use crate::policy::Policy;

// --- Core Data Structures ---
pub use crate::candidates::{ActionSampler, CandidateBatch};
pub use crate::error::{AttuneError, AttuneResult};
pub use crate::models::{ModelMetadata, Prediction};
pub use crate::optimizer::{
    ChannelGains, OptimizationLog, ParameterBounds, StopCriteria, TuningReport,
};
pub use crate::rollout::{RolloutConfig, DEFAULT_DISCOUNT};
pub use crate::types::{Action, ActionBatch, Cost, Reward, State, StateBatch};

// --- Concrete Implementations (Export common ones for convenience) ---
pub use crate::cost::AttitudeCost;
pub use crate::env::{ActionSpace, AttitudeEnvironment};
pub use crate::models::linear::{LinearModel, LinearModelFile};
pub use crate::mpc::{MpcConfig, MpcPlan, MpcPolicy};
pub use crate::objective::PidObjective;
pub use crate::optimizer::RandomSearch;
pub use crate::policy::{quad_plus_mixer, GainLayout, PidChannel, PidGains, PidPolicy};
