// attune_sim/src/harness/runners/mod.rs

//! One runner per CLI command. Each takes the loaded context explicitly.

pub mod mpc;
pub mod rollout;
pub mod tune;

pub use mpc::run_mpc;
pub use rollout::run_rollout;
pub use tune::run_tune;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::config::{parse_experiment, PrefabCatalog};
    use crate::harness::core::context::ExperimentContext;
    use crate::harness::core::data::Trajectory;
    use crate::harness::report::{COSTS_FILE, MPC_TRAJECTORY_FILE, PARAMETERS_FILE};
    use attune_core::models::linear::LinearModel;
    use attune_core::models::ModelMetadata;
    use nalgebra::{dvector, DMatrix, DVector};
    use std::path::Path;

    /// Pitch and roll respond to the motor differences of a plus-frame quad.
    fn model() -> LinearModel {
        let names = ["pitch", "roll", "yaw", "wx", "wy", "wz"];
        let meta = ModelMetadata {
            state_columns: names.iter().map(|n| n.to_string()).collect(),
            input_columns: (1..=4).map(|i| format!("m{i}")).collect(),
            target_columns: names.iter().map(|n| format!("{n}_dx")).collect(),
        };
        let mut w = DMatrix::zeros(6, 10);
        w[(0, 6)] = 0.5;
        w[(0, 8)] = -0.5;
        w[(1, 9)] = 0.5;
        w[(1, 7)] = -0.5;
        LinearModel::new(meta, w, DVector::zeros(6), DVector::zeros(6)).unwrap()
    }

    fn trajectory() -> Trajectory {
        let states = vec![
            dvector![4.0, -2.0, 0.0, 0.1, 0.0, 0.0],
            dvector![-3.0, 1.0, 0.0, 0.0, 0.2, 0.0],
            dvector![45.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        Trajectory {
            actions: vec![DVector::zeros(4); states.len()],
            targets: vec![DVector::zeros(6); states.len()],
            states,
        }
    }

    fn context(output_dir: &Path) -> ExperimentContext {
        let src = format!(
            r#"
            [experiment]
            seed = 3
            output_dir = '{}'

            [data]
            model_file = "unused.toml"
            trajectory_csv = "unused.csv"

            [bo]
            iterations = 15
            max_length = 10
            discount = 0.9

            [policy]
            equilibrium = [0.0, 0.0, 0.0, 0.0]
            [policy.pid.params]
            min_values = [0.0, 0.0]
            max_values = [1.0, 0.5]

            [mpc]
            n = 64
            t = 3
            action_low = [-1.0, -1.0, -1.0, -1.0]
            action_high = [1.0, 1.0, 1.0, 1.0]
            steps = 5
            "#,
            output_dir.display()
        );
        let config = parse_experiment(&src, &PrefabCatalog::default()).unwrap();
        ExperimentContext::from_parts(config, model(), trajectory()).unwrap()
    }

    #[test]
    fn test_tune_writes_reports_and_best_gains() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        // The 45 degree row is outside the level-flight window.
        assert_eq!(ctx.initial_states.len(), 2);

        let report = run_tune(&mut ctx).unwrap().unwrap();
        assert_eq!(report.log.n_evals(), 15);
        assert_eq!(report.channels.len(), 2);
        assert_eq!(report.channels[1].name, "roll");
        assert!(report.channels.iter().all(|c| c.gains.ki == 0.0));
        assert!(dir.path().join(COSTS_FILE).exists());
        assert!(dir.path().join(PARAMETERS_FILE).exists());
    }

    #[test]
    fn test_tune_is_reproducible_with_a_seed() {
        let a = run_tune(&mut context(tempfile::tempdir().unwrap().path()))
            .unwrap()
            .unwrap();
        let b = run_tune(&mut context(tempfile::tempdir().unwrap().path()))
            .unwrap()
            .unwrap();
        assert_eq!(a.best_parameters, b.best_parameters);
        assert_eq!(a.best_objective.to_bits(), b.best_objective.to_bits());
    }

    #[test]
    fn test_rollout_matches_tuning_objective() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let report = run_tune(&mut ctx).unwrap().unwrap();
        let cost = run_rollout(&ctx, &report.best_parameters).unwrap();
        assert_eq!(cost.value(), report.best_objective);
    }

    #[test]
    fn test_rollout_rejects_wrong_gain_count() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        assert!(run_rollout(&ctx, &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_mpc_run_records_every_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let records = run_mpc(&mut ctx, Some(4)).unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.action.len() == 4 && r.state.len() == 6));
        assert!(records
            .iter()
            .all(|r| r.action.iter().all(|a| (-1.0..=1.0).contains(a))));
        assert!(dir.path().join(MPC_TRAJECTORY_FILE).exists());
    }
}
