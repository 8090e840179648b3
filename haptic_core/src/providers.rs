// haptic_core/src/providers.rs

//! Contracts for the engines that feed the sensors.
//!
//! The physics simulator, a kinematic playback tool, or a mock in a test all
//! sit behind these traits; sensors never see the engine itself.

use nalgebra::Isometry3;

use crate::geometry::PatchVolume;
use crate::messages::{ContactPoint, Wrench};
use crate::types::LinkHandle;

/// Anything that can report where the robot's links are.
pub trait PoseProvider {
    /// Number of links in the sensed robot. Valid handles are `0..num_links()`.
    fn num_links(&self) -> usize;

    /// Current world pose of a link, or `None` if the link is unknown.
    fn link_pose(&self, link: LinkHandle) -> Option<Isometry3<f64>>;
}

/// The view a dynamics step gives the sensors.
pub trait PhysicsProvider: PoseProvider {
    /// Every contact acting on `link` during the current step.
    fn contacts(&self, link: LinkHandle) -> &[ContactPoint];

    /// The constraint wrench the parent joint applies to `link` this step.
    /// `None` means the engine resolved no constraint force for that joint.
    fn joint_wrench(&self, link: LinkHandle) -> Option<Wrench>;
}

/// The view a kinematic-only step gives the sensors: poses and geometry, no forces.
pub trait KinematicProvider: PoseProvider {
    /// True if any world geometry other than `link` itself penetrates `volume`.
    fn penetrates(&self, link: LinkHandle, volume: &PatchVolume) -> bool;
}
