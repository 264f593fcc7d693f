// attune_sim/src/harness/runners/mpc.rs

use attune_core::cost::{AttitudeCost, CostFunction};
use attune_core::env::AttitudeEnvironment;
use attune_core::models::predict_next;
use attune_core::mpc::MpcPolicy;
use attune_core::policy::Policy;
use attune_core::rollout::advance;
use tracing::{debug, info};

use crate::error::HarnessResult;
use crate::harness::core::context::ExperimentContext;
use crate::harness::core::data::pick_initial_state;
use crate::harness::report::{MpcStepRecord, ReportDir};

/// Flies the MPC policy in closed loop, with the learned model standing in
/// for the vehicle, and writes `mpc_trajectory.csv`.
pub fn run_mpc(ctx: &mut ExperimentContext, steps: Option<usize>) -> HarnessResult<Vec<MpcStepRecord>> {
    let cfg = &ctx.config;
    let steps = steps.unwrap_or(cfg.mpc.steps);
    let env = AttitudeEnvironment::new(cfg.mpc.action_space()?);
    let mut mpc = MpcPolicy::new(
        Box::new(ctx.model.clone()),
        Box::new(env),
        cfg.mpc.mpc_config(),
        ctx.rng.fork(),
    )?;
    let cost_fn = AttitudeCost::default();

    let mut state = pick_initial_state(&ctx.initial_states, &mut ctx.rng.0).clone();
    info!(
        steps,
        candidates = cfg.mpc.n,
        horizon = cfg.mpc.t,
        "Starting closed-loop MPC run"
    );

    let mut records = Vec::with_capacity(steps);
    let mut total = 0.0;
    for step in 0..steps {
        let action = mpc.get_action(&state)?;
        let next = predict_next(&ctx.model, &state, &action)?.next_state;
        let cost = cost_fn.cost_single(&next, &action)?.value();
        debug!(step, cost, ?action, "MPC step");

        records.push(MpcStepRecord {
            step,
            state: state.rows(0, next.len()).into_owned(),
            action,
            cost,
        });
        total += cost;
        state = advance(&next, &state)?;
    }

    info!(total_cost = total, "MPC run finished");
    let reports = ReportDir::create(&cfg.experiment.output_dir)?;
    let path = reports.write_mpc_trajectory(&records)?;
    info!("Wrote MPC trajectory to {:?}", path);
    Ok(records)
}
