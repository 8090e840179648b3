// haptic_core/src/scene.rs

use nalgebra::Isometry3;
use std::collections::HashMap;

use crate::geometry::{Obstacle, PatchVolume};
use crate::messages::{ContactPoint, Wrench};
use crate::providers::{KinematicProvider, PhysicsProvider, PoseProvider};
use crate::types::LinkHandle;

// A snapshot of everything the sensors can ask an engine for during one step.
// Adapters for real engines fill one of these; tests build them by hand.
#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    num_links: usize,
    /// The pose of every link relative to the World frame. Missing entries are identity.
    transforms_to_world: HashMap<LinkHandle, Isometry3<f64>>,
    /// Contacts generated this step, grouped by the link they act on.
    contacts: HashMap<LinkHandle, Vec<ContactPoint>>,
    /// Constraint wrench of each link's parent joint.
    joint_wrenches: HashMap<LinkHandle, Wrench>,
    /// Static world geometry for kinematic contact queries.
    obstacles: Vec<Obstacle>,
}

impl SceneSnapshot {
    pub fn new(num_links: usize) -> Self {
        Self {
            num_links,
            ..Default::default()
        }
    }

    pub fn set_link_pose(&mut self, link: LinkHandle, pose: Isometry3<f64>) {
        self.transforms_to_world.insert(link, pose);
    }

    pub fn add_contact(&mut self, link: LinkHandle, contact: ContactPoint) {
        self.contacts.entry(link).or_default().push(contact);
    }

    pub fn set_joint_wrench(&mut self, link: LinkHandle, wrench: Wrench) {
        self.joint_wrenches.insert(link, wrench);
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Drops the per-step dynamics data (contacts and wrenches), keeping poses and geometry.
    pub fn clear_dynamics(&mut self) {
        self.contacts.clear();
        self.joint_wrenches.clear();
    }
}

impl PoseProvider for SceneSnapshot {
    fn num_links(&self) -> usize {
        self.num_links
    }

    fn link_pose(&self, link: LinkHandle) -> Option<Isometry3<f64>> {
        if !link.is_valid_for(self.num_links) {
            return None;
        }
        Some(
            self.transforms_to_world
                .get(&link)
                .copied()
                .unwrap_or_else(Isometry3::identity),
        )
    }
}

impl PhysicsProvider for SceneSnapshot {
    fn contacts(&self, link: LinkHandle) -> &[ContactPoint] {
        self.contacts.get(&link).map(Vec::as_slice).unwrap_or(&[])
    }

    fn joint_wrench(&self, link: LinkHandle) -> Option<Wrench> {
        self.joint_wrenches.get(&link).copied()
    }
}

impl KinematicProvider for SceneSnapshot {
    fn penetrates(&self, _link: LinkHandle, volume: &PatchVolume) -> bool {
        self.obstacles.iter().any(|o| o.penetrates(volume))
    }
}
