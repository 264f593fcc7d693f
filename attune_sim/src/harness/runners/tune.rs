// attune_sim/src/harness/runners/tune.rs

use attune_core::cost::AttitudeCost;
use attune_core::objective::PidObjective;
use attune_core::optimizer::{BlackBoxOptimizer, RandomSearch, TuningReport};
use tracing::{info, warn};

use crate::error::HarnessResult;
use crate::harness::core::context::ExperimentContext;
use crate::harness::core::data::pick_initial_state;
use crate::harness::report::{log_tuning_summary, ReportDir};

/// Searches PID gains that minimize the summed closed-loop attitude cost
/// over the evaluation set, then writes `costs.csv` and `parameters.csv`.
///
/// Returns `None` when no evaluation produced a finite cost.
pub fn run_tune(ctx: &mut ExperimentContext) -> HarnessResult<Option<TuningReport>> {
    let cfg = &ctx.config;
    let policy = cfg.policy.build_policy()?;
    let channels = policy.channels().to_vec();
    let layout = policy.layout();
    let bounds = cfg.policy.bounds(policy.num_pids())?;
    let cost_fn = AttitudeCost::default();

    let mut objective = PidObjective::new(
        &ctx.model,
        &cost_fn,
        policy,
        ctx.initial_states.clone(),
        cfg.bo.rollout()?,
    )?;

    // Untuned baseline from one randomly picked logged state.
    let s0 = pick_initial_state(&ctx.initial_states, &mut ctx.rng.0).clone();
    let baseline = objective.rollout_from(&s0)?;
    info!(
        baseline_cost = baseline.value(),
        evaluation_states = ctx.initial_states.len(),
        "Initialized BO objective of PID control"
    );

    let mut optimizer = RandomSearch::new(ctx.rng.fork());
    let log = optimizer.optimize(&mut objective, &bounds, cfg.bo.stop_criteria())?;

    let reports = ReportDir::create(&cfg.experiment.output_dir)?;
    let costs_path = reports.write_costs(&log)?;
    info!("Wrote cost history to {:?}", costs_path);

    let Some(report) = TuningReport::from_log(log, &channels, layout)? else {
        warn!("No evaluation produced a finite cost; no best parameters to report.");
        return Ok(None);
    };
    log_tuning_summary(&report, &channels, layout);
    let params_path = reports.write_parameters(&report, &channels, layout)?;
    info!("Wrote sampled parameters to {:?}", params_path);
    Ok(Some(report))
}
