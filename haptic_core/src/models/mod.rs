// haptic_core/src/models/mod.rs

pub mod conditioning;
pub mod sensors;
