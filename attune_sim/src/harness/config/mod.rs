// attune_sim/src/harness/config/mod.rs

//! This module handles loading, resolving, and validating the experiment
//! configuration from disk, including the prefab catalog system.

mod catalog;
mod resolver;

pub mod structs;

use figment::{
    providers::{Format, Serialized, Toml},
    value::Value,
    Figment,
};
use std::path::Path;
use tracing::info;

use crate::error::{HarnessError, HarnessResult};
pub use catalog::PrefabCatalog;
pub use resolver::resolve_document;
pub use structs::{
    BoConfig, DataConfig, ExperimentConfig, ExperimentSection, MpcSection, PidMode, PolicyConfig,
};

/// Parses `src` as an experiment document and resolves it against `catalog`.
pub fn parse_experiment(src: &str, catalog: &PrefabCatalog) -> HarnessResult<ExperimentConfig> {
    let raw: Value = Figment::new().merge(Toml::string(src)).extract()?;
    extract_resolved(&raw, catalog)
}

/// Loads the experiment file at `config_path`, resolving `from` references
/// against the prefabs found under `catalog_dir`.
pub fn load_experiment(config_path: &Path, catalog_dir: &Path) -> HarnessResult<ExperimentConfig> {
    if !config_path.exists() {
        return Err(HarnessError::ConfigNotFound(config_path.to_path_buf()));
    }
    info!("Loading experiment from: {:?}", config_path);

    let catalog = PrefabCatalog::load_from_disk(catalog_dir);
    let raw: Value = Figment::new().merge(Toml::file(config_path)).extract()?;
    extract_resolved(&raw, &catalog)
}

fn extract_resolved(raw: &Value, catalog: &PrefabCatalog) -> HarnessResult<ExperimentConfig> {
    let resolved = resolve_document(raw, catalog)?;
    let config: ExperimentConfig = Figment::from(Serialized::defaults(resolved)).extract()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::error::AttuneError;
    use attune_core::policy::GainLayout;

    const MINIMAL: &str = r#"
        [data]
        model_file = "model.toml"
        trajectory_csv = "flight.csv"
    "#;

    #[test]
    fn test_minimal_file_gets_defaults() {
        let cfg = parse_experiment(MINIMAL, &PrefabCatalog::default()).unwrap();
        assert_eq!(cfg.data.max_abs_pitch, 10.0);
        assert_eq!(cfg.data.max_abs_roll, 10.0);
        assert_eq!(cfg.bo.discount, 0.9);
        assert_eq!(cfg.policy.mode, PidMode::Euler);
        assert_eq!(cfg.policy.layout, GainLayout::ProportionalDerivative);
        assert_eq!(cfg.experiment.seed, None);
    }

    #[test]
    fn test_full_file_parses() {
        let src = r#"
            [experiment]
            seed = 42
            output_dir = "runs/one"

            [data]
            model_file = "model.toml"
            trajectory_csv = "flight.csv"
            max_abs_pitch = 5.0

            [bo]
            iterations = 7
            max_length = 30
            discount = 0.8

            [policy]
            mode = "rate"
            layout = "full"
            equilibrium = [30000.0, 30000.0, 30000.0, 30000.0]
            integral_limit = 20.0
            [policy.pid.params]
            min_values = [0.0, 0.0, 0.0]
            max_values = [10.0, 1.0, 1.0]

            [mpc]
            n = 100
            t = 5
            hold = true
            action_low = [0.0, 0.0, 0.0, 0.0]
            action_high = [1.0, 1.0, 1.0, 1.0]
            steps = 3
        "#;
        let cfg = parse_experiment(src, &PrefabCatalog::default()).unwrap();
        assert_eq!(cfg.experiment.seed, Some(42));
        assert_eq!(cfg.bo.iterations, 7);
        assert_eq!(cfg.policy.mode, PidMode::Rate);
        assert_eq!(cfg.policy.layout, GainLayout::Full);
        assert!(cfg.mpc.hold);

        let policy = cfg.policy.build_policy().unwrap();
        assert_eq!(policy.channels()[0].state_index, 3);
        assert_eq!(cfg.policy.bounds(policy.num_pids()).unwrap().dimension(), 6);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let src = format!("{MINIMAL}\n[bo]\niterations = 1\nmax_length = 1\ndiscount = 0.9\nbogus = 1\n");
        assert!(matches!(
            parse_experiment(&src, &PrefabCatalog::default()),
            Err(HarnessError::Config(_))
        ));
    }

    #[test]
    fn test_infinite_gain_bounds_are_rejected() {
        let src = format!(
            "{MINIMAL}\n[policy.pid.params]\nmin_values = [0.0, -inf]\nmax_values = [1.0, 1.0]\n"
        );
        let cfg = parse_experiment(&src, &PrefabCatalog::default()).unwrap();
        assert!(matches!(
            cfg.policy.bounds(2),
            Err(HarnessError::Core(AttuneError::InvalidBounds(_)))
        ));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = load_experiment(Path::new("/no/such/experiment.toml"), Path::new("/no/catalog"))
            .unwrap_err();
        assert!(matches!(err, HarnessError::ConfigNotFound(_)));
    }

    #[test]
    fn test_sample_experiment_takes_mpc_from_catalog() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
        let cfg = load_experiment(
            &root.join("conf/experiment.toml"),
            &root.join("conf/catalog"),
        )
        .unwrap();
        assert_eq!(cfg.mpc.n, 500);
        assert_eq!(cfg.mpc.t, 10);
        assert_eq!(cfg.mpc.action_low, vec![25000.0; 4]);
        assert_eq!(cfg.mpc.steps, 100);
        assert_eq!(cfg.policy.equilibrium, vec![30000.0; 4]);
    }

    #[test]
    fn test_policy_section_from_catalog_prefab() {
        let mut catalog = PrefabCatalog::default();
        let prefab: Value = Figment::new()
            .merge(Toml::string(
                r#"
                mode = "rate"
                equilibrium = [1.0, 1.0, 1.0, 1.0]
                "#,
            ))
            .extract()
            .unwrap();
        catalog.0.insert("policies.rate".into(), prefab);

        let src = format!("{MINIMAL}\n[policy]\nfrom = \"policies.rate\"\nintegral_limit = 3.0\n");
        let cfg = parse_experiment(&src, &catalog).unwrap();
        assert_eq!(cfg.policy.mode, PidMode::Rate);
        assert_eq!(cfg.policy.integral_limit, Some(3.0));
        assert_eq!(cfg.policy.equilibrium, vec![1.0; 4]);
    }
}
