// haptic_sim/src/lib.rs

//! Headless driver for the `haptic_core` sensor models: loads scenario files,
//! steps a scripted world, and records or replays measurement logs.

// This prelude is for convenience for other files WITHIN the haptic_sim crate.
pub mod prelude;

pub mod cli;
pub mod error;
pub mod simulation;
