// haptic_sim/src/simulation/mod.rs

pub mod config;
pub mod log;
pub mod runner;
pub mod serde_helpers;
pub mod world;
