// attune_sim/src/harness/report.rs

//! CSV reports of a run and their log summaries.

use attune_core::optimizer::{OptimizationLog, TuningReport};
use attune_core::policy::{GainLayout, PidChannel};
use attune_core::types::{Action, State};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{HarnessError, HarnessResult};

pub const COSTS_FILE: &str = "costs.csv";
pub const PARAMETERS_FILE: &str = "parameters.csv";
pub const MPC_TRAJECTORY_FILE: &str = "mpc_trajectory.csv";

/// The directory a run writes its reports into.
#[derive(Debug, Clone)]
pub struct ReportDir(PathBuf);

impl ReportDir {
    pub fn create(dir: &Path) -> HarnessResult<Self> {
        fs::create_dir_all(dir).map_err(|source| HarnessError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self(dir.to_path_buf()))
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.0.join(file)
    }

    fn open(&self, file: &str) -> HarnessResult<fs::File> {
        let path = self.path(file);
        fs::File::create(&path).map_err(|source| HarnessError::Io { path, source })
    }

    pub fn write_costs(&self, log: &OptimizationLog) -> HarnessResult<PathBuf> {
        write_costs(self.open(COSTS_FILE)?, log)?;
        Ok(self.path(COSTS_FILE))
    }

    pub fn write_parameters(
        &self,
        report: &TuningReport,
        channels: &[PidChannel],
        layout: GainLayout,
    ) -> HarnessResult<PathBuf> {
        write_parameters(self.open(PARAMETERS_FILE)?, report, channels, layout)?;
        Ok(self.path(PARAMETERS_FILE))
    }

    pub fn write_mpc_trajectory(&self, steps: &[MpcStepRecord]) -> HarnessResult<PathBuf> {
        write_mpc_trajectory(self.open(MPC_TRAJECTORY_FILE)?, steps)?;
        Ok(self.path(MPC_TRAJECTORY_FILE))
    }
}

/// `iteration,cost,best_cost`, one row per objective evaluation.
pub fn write_costs<W: Write>(writer: W, log: &OptimizationLog) -> HarnessResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["iteration", "cost", "best_cost"])?;
    for (i, (cost, best)) in log
        .objectives()
        .into_iter()
        .zip(log.running_best())
        .enumerate()
    {
        wtr.write_record([i.to_string(), cost.to_string(), best.to_string()])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Column names of the flat gain vector, e.g. `pitch_kp,pitch_kd,roll_kp,...`.
pub fn parameter_labels(channels: &[PidChannel], layout: GainLayout) -> Vec<String> {
    channels
        .iter()
        .flat_map(|c| layout.labels().iter().map(move |l| format!("{}_{l}", c.name)))
        .collect()
}

/// Every sampled gain vector with its objective, then a final `best` row.
pub fn write_parameters<W: Write>(
    writer: W,
    report: &TuningReport,
    channels: &[PidChannel],
    layout: GainLayout,
) -> HarnessResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["evaluation".to_string()];
    header.extend(parameter_labels(channels, layout));
    header.push("objective".into());
    wtr.write_record(&header)?;

    let row = |tag: String, params: &[f64], objective: f64| {
        let mut r = vec![tag];
        r.extend(params.iter().map(f64::to_string));
        r.push(objective.to_string());
        r
    };
    for (i, e) in report.log.evaluations.iter().enumerate() {
        wtr.write_record(row(i.to_string(), &e.parameters, e.objective))?;
    }
    wtr.write_record(row(
        "best".into(),
        &report.best_parameters,
        report.best_objective,
    ))?;
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// One closed-loop MPC step: the state the plan was made from, the executed
/// action and the cost of the state it led to.
#[derive(Debug, Clone, PartialEq)]
pub struct MpcStepRecord {
    pub step: usize,
    pub state: State,
    pub action: Action,
    pub cost: f64,
}

pub fn write_mpc_trajectory<W: Write>(writer: W, steps: &[MpcStepRecord]) -> HarnessResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let Some(first) = steps.first() else {
        wtr.write_record(["step", "cost"])?;
        wtr.flush().map_err(csv::Error::from)?;
        return Ok(());
    };

    let mut header = vec!["step".to_string()];
    header.extend((0..first.state.len()).map(|i| format!("s{i}")));
    header.extend((0..first.action.len()).map(|i| format!("a{i}")));
    header.push("cost".into());
    wtr.write_record(&header)?;

    for rec in steps {
        let mut r = vec![rec.step.to_string()];
        r.extend(rec.state.iter().map(f64::to_string));
        r.extend(rec.action.iter().map(f64::to_string));
        r.push(rec.cost.to_string());
        wtr.write_record(&r)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Logs the best gains per controller, then every other gain set tried.
pub fn log_tuning_summary(report: &TuningReport, channels: &[PidChannel], layout: GainLayout) {
    info!(
        "Best PID parameters found with loss of: {} in {} evaluations.",
        report.best_objective,
        report.log.n_evals()
    );
    for c in &report.channels {
        info!(
            "{:<8} Prop: {}  Int: {}  Deriv: {}",
            c.name, c.gains.kp, c.gains.ki, c.gains.kd
        );
    }

    info!("Other items tried");
    let labels = parameter_labels(channels, layout);
    for e in &report.log.evaluations {
        let params: Vec<String> = labels
            .iter()
            .zip(&e.parameters)
            .map(|(l, p)| format!("{l}: {p}"))
            .collect();
        info!("Cost - {}: {}", e.objective, params.join("  "));
    }
}
