// haptic_core/src/messages.rs

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

// =========================================================================
// == Raw Physics Data ==
// =========================================================================

/// A single contact point reported by the physics engine for one step.
/// All quantities are expressed in the WORLD frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactPoint {
    pub position: Point3<f64>,
    /// Unit contact normal, pointing out of the link.
    pub normal: Vector3<f64>,
    /// The force the contact applies to the link.
    pub force: Vector3<f64>,
}

impl ContactPoint {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>, force: Vector3<f64>) -> Self {
        Self {
            position,
            normal,
            force,
        }
    }
}

/// The constraint wrench a joint applies to its child link.
///
/// Force and torque are in the WORLD frame; the torque is taken about the
/// child link's origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Wrench {
    pub force: Vector3<f64>,
    pub torque: Vector3<f64>,
}

impl Wrench {
    pub fn new(force: Vector3<f64>, torque: Vector3<f64>) -> Self {
        Self { force, torque }
    }

    /// The reaction wrench felt by the parent link.
    pub fn reaction(&self) -> Self {
        Self {
            force: -self.force,
            torque: -self.torque,
        }
    }
}
