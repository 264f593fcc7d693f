// attune_sim/src/harness/mod.rs

pub mod config;
pub mod core;
pub mod report;
pub mod runners;
