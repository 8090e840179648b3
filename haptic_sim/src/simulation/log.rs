// haptic_sim/src/simulation/log.rs

use haptic_core::suite::SensorReading;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SimError;

/// One sensor's reported values at one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub step: u32,
    pub time: f64,
    pub sensor: String,
    pub values: Vec<f64>,
}

/// Every measurement produced by a run, in step order.
///
/// Written as TOML (`[[records]]` tables) so a run can be inspected by hand
/// and fed back through `--replay`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementLog {
    #[serde(default)]
    pub records: Vec<MeasurementRecord>,
}

impl MeasurementLog {
    pub fn record(&mut self, step: u32, time: f64, readings: Vec<SensorReading>) {
        self.records
            .extend(readings.into_iter().map(|r| MeasurementRecord {
                step,
                time,
                sensor: r.sensor,
                values: r.values,
            }));
    }

    /// Records belonging to `step`.
    pub fn at_step(&self, step: u32) -> impl Iterator<Item = &MeasurementRecord> {
        self.records.iter().filter(move |r| r.step == step)
    }

    pub fn last_step(&self) -> Option<u32> {
        self.records.iter().map(|r| r.step).max()
    }

    pub fn to_toml_string(&self) -> Result<String, SimError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SimError> {
        Ok(toml::from_str(text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), SimError> {
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
