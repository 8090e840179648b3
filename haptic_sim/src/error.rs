// haptic_sim/src/error.rs

use haptic_core::error::SensorError;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a scenario from running.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to load scenario: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("invalid sensor configuration for '{sensor}': {source}")]
    Sensor {
        sensor: String,
        #[source]
        source: SensorError,
    },

    #[error("duplicate link id {0} in scenario")]
    DuplicateLink(usize),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode measurement log: {0}")]
    LogEncode(#[from] toml::ser::Error),

    #[error("failed to decode measurement log: {0}")]
    LogDecode(#[from] toml::de::Error),

    #[error("no scenario files found under {0:?}")]
    NoScenarios(PathBuf),

    #[error("replay log step {0} is past the last step a run can reach")]
    ReplayStepOutOfRange(u32),

    #[error("--log and --replay need a single scenario file, found {0} scenarios")]
    LogNeedsSingleScenario(usize),
}

impl From<figment::Error> for SimError {
    fn from(e: figment::Error) -> Self {
        SimError::Config(Box::new(e))
    }
}
