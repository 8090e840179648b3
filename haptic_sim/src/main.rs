// haptic_sim/src/main.rs

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use haptic_sim::cli::Cli;
use haptic_sim::error::SimError;
use haptic_sim::simulation::{config, log::MeasurementLog, runner};

fn main() -> ExitCode {
    // A good filter for focusing on our crates' logs; RUST_LOG overrides it.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,haptic_sim=debug,haptic_core=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), SimError> {
    let scenarios = config::discover_scenarios(&cli.scenario)?;
    if scenarios.len() > 1 && (cli.log.is_some() || cli.replay.is_some()) {
        return Err(SimError::LogNeedsSingleScenario(scenarios.len()));
    }

    let replay = cli.replay.as_deref().map(MeasurementLog::load).transpose()?;

    for path in &scenarios {
        info!("Loading scenario from: {:?}", path);
        let scenario = config::load_scenario(path)?;
        let options = runner::RunOptions {
            seed: cli.seed,
            steps: cli.steps,
            kinematic: cli.kinematic,
            replay: replay.clone(),
        };
        let summary = runner::run_scenario(&scenario, &options)?;
        info!(
            "Scenario {:?} finished: {} steps, {} sensor failures",
            path, summary.steps, summary.failures
        );
        if let Some(log_path) = &cli.log {
            summary.log.save(log_path)?;
            info!("Measurement log written to {:?}", log_path);
        }
    }
    Ok(())
}
