// haptic_sim/src/prelude.rs

// Re-export the entire haptic_core prelude so the pure types are one import away.
pub use haptic_core::prelude::*;

// Re-export common simulation-specific types.
pub use crate::error::SimError;
pub use crate::simulation::config::{ScenarioConfig, SensorConfig, SimulationMode};
pub use crate::simulation::log::{MeasurementLog, MeasurementRecord};
pub use crate::simulation::runner::{run_scenario, RunOptions, RunSummary};
pub use crate::simulation::world::ScriptedWorld;
