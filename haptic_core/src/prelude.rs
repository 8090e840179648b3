// haptic_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::models::sensors::{create_sensor, PhysicalSensor};
pub use crate::providers::{KinematicProvider, PhysicsProvider, PoseProvider};

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::error::SensorError;
pub use crate::geometry::{Obstacle, PatchRect, PatchVolume};
pub use crate::messages::{ContactPoint, Wrench};
pub use crate::prng::SensorRng;
pub use crate::scene::SceneSnapshot;
pub use crate::suite::{SensorReading, SensorSuite};
pub use crate::types::LinkHandle;

// --- Concrete Sensor Implementations ---
pub use crate::models::conditioning::SignalConditioning;
pub use crate::models::sensors::{ContactPatchSensor, ForceTorqueSensor};
