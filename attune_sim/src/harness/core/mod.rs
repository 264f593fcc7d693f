// attune_sim/src/harness/core/mod.rs

pub mod context;
pub mod data;
pub mod prng;
