// attune_sim/src/harness/runners/rollout.rs

use attune_core::cost::AttitudeCost;
use attune_core::objective::PidObjective;
use attune_core::types::Cost;
use tracing::info;

use crate::error::HarnessResult;
use crate::harness::core::context::ExperimentContext;

/// Scores one flat gain vector over the whole evaluation set.
pub fn run_rollout(ctx: &ExperimentContext, gains: &[f64]) -> HarnessResult<Cost> {
    let cfg = &ctx.config;
    let cost_fn = AttitudeCost::default();
    let mut objective = PidObjective::new(
        &ctx.model,
        &cost_fn,
        cfg.policy.build_policy()?,
        ctx.initial_states.clone(),
        cfg.bo.rollout()?,
    )?;
    let cost = objective.evaluate_gains(gains)?;
    info!(
        ?gains,
        cost = cost.value(),
        states = ctx.initial_states.len(),
        "Evaluated gains"
    );
    Ok(cost)
}
