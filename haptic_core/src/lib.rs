// haptic_core/src/lib.rs

// This file defines the public modules of the library.
pub mod error;
pub mod geometry;
pub mod messages;
pub mod models;
pub mod prelude;
pub mod prng;
pub mod providers;
pub mod scene;
pub mod settings;
pub mod suite;
pub mod types;
