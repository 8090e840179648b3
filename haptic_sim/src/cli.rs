// haptic_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Haptic: simulated tactile and force/torque sensors.
///
/// Runs one scenario file, or every `.toml` scenario below a directory, and
/// prints the reported measurements at each step.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The scenario TOML file, or a directory of scenario files, to run.
    #[arg(short, long, default_value = "assets/scenarios/fingertip_press.toml")]
    pub scenario: PathBuf,

    /// Override the noise seed from the scenario.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the number of steps from the scenario.
    #[arg(long)]
    pub steps: Option<u32>,

    /// Run without forces: contact from geometric penetration only.
    #[arg(long, default_value_t = false)]
    pub kinematic: bool,

    /// Write every step's measurements to this TOML log.
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Replay a recorded measurement log instead of simulating.
    #[arg(long, conflicts_with = "kinematic")]
    pub replay: Option<PathBuf>,
}
