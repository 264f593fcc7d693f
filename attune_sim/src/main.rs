// attune_sim/src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use attune_sim::cli::{Cli, Command};
use attune_sim::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = load_experiment(&cli.config, &cli.catalog)?;
    tracing::info!("============= Configuration =============");
    tracing::info!("{:#?}", config);
    tracing::info!("=========================================");

    let mut ctx = ExperimentContext::load(config)?;
    match cli.command {
        Command::Tune => {
            run_tune(&mut ctx)?;
        }
        Command::Rollout { gains } => {
            run_rollout(&ctx, &gains)?;
        }
        Command::Mpc { steps } => {
            run_mpc(&mut ctx, steps)?;
        }
    }
    Ok(())
}
