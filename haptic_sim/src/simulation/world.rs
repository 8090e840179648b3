// haptic_sim/src/simulation/world.rs

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::prelude::*;
use crate::simulation::config::{ScriptedContact, ScriptedWrench};

/// A stand-in physics engine driven entirely by the scenario file.
///
/// Link poses and obstacles are fixed for the whole run; contacts and joint
/// wrenches are switched on and off by their step windows.
#[derive(Debug, Clone)]
pub struct ScriptedWorld {
    scene: SceneSnapshot,
    contacts: Vec<ScriptedContact>,
    wrenches: Vec<ScriptedWrench>,
}

impl ScriptedWorld {
    pub fn from_config(config: &ScenarioConfig) -> Result<Self, SimError> {
        let mut scene = SceneSnapshot::new(config.num_links());

        let mut seen = BTreeSet::new();
        for link in &config.links {
            if !seen.insert(link.id) {
                return Err(SimError::DuplicateLink(link.id));
            }
            scene.set_link_pose(LinkHandle(link.id), link.pose.to_isometry());
        }
        for obstacle in &config.obstacles {
            scene.add_obstacle(obstacle.to_obstacle());
        }
        debug!(
            "Scripted world: {} links, {} obstacles",
            scene.num_links(),
            scene.obstacles().len()
        );

        Ok(Self {
            scene,
            contacts: config.contacts.clone(),
            wrenches: config.wrenches.clone(),
        })
    }

    /// Advances the scripted dynamics to `step` and returns the scene to sense.
    pub fn step(&mut self, step: u32) -> &SceneSnapshot {
        self.scene.clear_dynamics();

        let mut active_contacts = 0;
        for c in self.contacts.iter().filter(|c| c.is_active(step)) {
            self.scene.add_contact(
                LinkHandle(c.link),
                ContactPoint::new(c.position, c.normal, c.force),
            );
            active_contacts += 1;
        }

        // Wrenches on the same joint during the same step add up.
        let mut wrenches: BTreeMap<usize, Wrench> = BTreeMap::new();
        for w in self.wrenches.iter().filter(|w| w.is_active(step)) {
            let total = wrenches.entry(w.link).or_default();
            total.force += w.force;
            total.torque += w.torque;
        }
        for (link, wrench) in wrenches {
            self.scene.set_joint_wrench(LinkHandle(link), wrench);
        }

        debug!("step {}: {} scripted contacts active", step, active_contacts);
        &self.scene
    }

    pub fn scene(&self) -> &SceneSnapshot {
        &self.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    const WORLD: &str = r#"
        [[links]]
        id = 0

        [[links]]
        id = 1
        pose = { translation = [0.0, 0.0, 0.5] }

        [[contacts]]
        link = 1
        position = [0.0, 0.0, 0.5]
        force = [0.0, 0.0, 2.0]
        until_step = 1

        [[wrenches]]
        link = 1
        force = [1.0, 0.0, 0.0]

        [[wrenches]]
        link = 1
        torque = [0.0, 0.0, 0.5]
        from_step = 2
    "#;

    #[test]
    fn test_contacts_follow_their_window() {
        let config = ScenarioConfig::from_toml_str(WORLD).unwrap();
        let mut world = ScriptedWorld::from_config(&config).unwrap();

        assert_eq!(world.step(0).contacts(LinkHandle(1)).len(), 1);
        assert_eq!(world.step(1).contacts(LinkHandle(1)).len(), 1);
        assert!(world.step(2).contacts(LinkHandle(1)).is_empty());
        assert!(world.scene().contacts(LinkHandle(0)).is_empty());
    }

    #[test]
    fn test_wrenches_on_one_joint_add_up() {
        let config = ScenarioConfig::from_toml_str(WORLD).unwrap();
        let mut world = ScriptedWorld::from_config(&config).unwrap();

        let early = world.step(0).joint_wrench(LinkHandle(1)).unwrap();
        assert_abs_diff_eq!(early.torque, Vector3::zeros(), epsilon = 1e-12);

        let late = world.step(3).joint_wrench(LinkHandle(1)).unwrap();
        assert_abs_diff_eq!(late.force, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(late.torque, Vector3::new(0.0, 0.0, 0.5), epsilon = 1e-12);
        assert!(world.scene().joint_wrench(LinkHandle(0)).is_none());
    }

    #[test]
    fn test_link_poses_come_from_config() {
        let config = ScenarioConfig::from_toml_str(WORLD).unwrap();
        let world = ScriptedWorld::from_config(&config).unwrap();
        assert_eq!(world.scene().num_links(), 2);
        assert!(world.scene().obstacles().is_empty());
        let pose = world.scene().link_pose(LinkHandle(1)).unwrap();
        assert_abs_diff_eq!(pose.translation.vector, Vector3::new(0.0, 0.0, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_duplicate_link_ids_are_rejected() {
        let config = ScenarioConfig::from_toml_str("[[links]]\nid = 0\n[[links]]\nid = 0\n").unwrap();
        assert!(matches!(
            ScriptedWorld::from_config(&config),
            Err(SimError::DuplicateLink(0))
        ));
    }
}
