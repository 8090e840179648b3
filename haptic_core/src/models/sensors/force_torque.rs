// haptic_core/src/models/sensors/force_torque.rs

use nalgebra::Vector3;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::{check_link, check_measurement_len, link_pose, PhysicalSensor, AXES};
use crate::error::SensorError;
use crate::models::conditioning::{mask_axes, SignalConditioning};
use crate::prng::SensorRng;
use crate::providers::{KinematicProvider, PhysicsProvider};
use crate::settings::{self, SettingField};
use crate::types::LinkHandle;

/// A force/torque sensor mounted in the joint between a link and its parent.
/// Up to six axes can be enabled.
///
/// Readings are the wrench the parent exerts on `link`, expressed in the link
/// frame about `local_pos`. The parent feels the negation.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceTorqueSensor {
    // --- Configuration ---
    pub link: LinkHandle,
    /// Sensor position in the link frame.
    pub local_pos: Vector3<f64>,
    pub has_force: [bool; 3],
    pub has_torque: [bool; 3],
    pub force_conditioning: SignalConditioning,
    pub torque_conditioning: SignalConditioning,

    // --- Measurement ---
    pub f: Vector3<f64>,
    pub t: Vector3<f64>,
}

impl Default for ForceTorqueSensor {
    fn default() -> Self {
        Self {
            link: LinkHandle(0),
            local_pos: Vector3::zeros(),
            has_force: [false; 3],
            has_torque: [false; 3],
            force_conditioning: SignalConditioning::default(),
            torque_conditioning: SignalConditioning::default(),
            f: Vector3::zeros(),
            t: Vector3::zeros(),
        }
    }
}

impl ForceTorqueSensor {
    pub const TYPE_NAME: &'static str = "ForceTorqueSensor";

    /// A six-axis sensor at `local_pos` on `link`.
    pub fn six_axis(link: LinkHandle, local_pos: Vector3<f64>) -> Self {
        Self {
            link,
            local_pos,
            has_force: [true; 3],
            has_torque: [true; 3],
            ..Default::default()
        }
    }

    fn fields() -> [SettingField<Self>; 10] {
        [
            SettingField {
                name: "link",
                get: |s| s.link.to_string(),
                set: |s, v| {
                    s.link = LinkHandle(settings::parse_index("link", v)?);
                    Ok(())
                },
            },
            SettingField {
                name: "localPos",
                get: |s| settings::format_vector3(&s.local_pos),
                set: |s, v| {
                    s.local_pos = settings::parse_vector3("localPos", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "hasForce",
                get: |s| settings::format_flags(&s.has_force),
                set: |s, v| {
                    s.has_force = settings::parse_flags("hasForce", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "hasTorque",
                get: |s| settings::format_flags(&s.has_torque),
                set: |s, v| {
                    s.has_torque = settings::parse_flags("hasTorque", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "fResolution",
                get: |s| settings::format_vector3(&s.force_conditioning.resolution),
                set: |s, v| {
                    s.force_conditioning.resolution =
                        settings::parse_non_negative_vector3("fResolution", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "fVariance",
                get: |s| settings::format_vector3(&s.force_conditioning.variance),
                set: |s, v| {
                    s.force_conditioning.variance =
                        settings::parse_non_negative_vector3("fVariance", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "fSaturation",
                get: |s| settings::format_vector3(&s.force_conditioning.saturation),
                set: |s, v| {
                    s.force_conditioning.saturation =
                        settings::parse_non_negative_vector3("fSaturation", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "tResolution",
                get: |s| settings::format_vector3(&s.torque_conditioning.resolution),
                set: |s, v| {
                    s.torque_conditioning.resolution =
                        settings::parse_non_negative_vector3("tResolution", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "tVariance",
                get: |s| settings::format_vector3(&s.torque_conditioning.variance),
                set: |s, v| {
                    s.torque_conditioning.variance =
                        settings::parse_non_negative_vector3("tVariance", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "tSaturation",
                get: |s| settings::format_vector3(&s.torque_conditioning.saturation),
                set: |s, v| {
                    s.torque_conditioning.saturation =
                        settings::parse_non_negative_vector3("tSaturation", v)?;
                    Ok(())
                },
            },
        ]
    }

    fn enabled_count(&self) -> usize {
        self.has_force.iter().chain(&self.has_torque).filter(|f| **f).count()
    }
}

impl PhysicalSensor for ForceTorqueSensor {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn link(&self) -> LinkHandle {
        self.link
    }

    fn validate(&self, num_links: usize) -> Result<(), SensorError> {
        check_link(self.link, num_links)?;
        self.force_conditioning.validate()?;
        self.torque_conditioning.validate()
    }

    fn simulate(
        &mut self,
        physics: &dyn PhysicsProvider,
        rng: &mut SensorRng,
    ) -> Result<(), SensorError> {
        self.validate(physics.num_links())?;
        let world_from_link = link_pose(physics, self.link)?;
        let wrench = physics.joint_wrench(self.link).unwrap_or_else(|| {
            debug!(link = self.link.0, "no joint wrench reported, reading zero");
            Default::default()
        });

        // --- 1. Rotate into the link frame and move the torque to the sensor point ---
        // tau_p = tau_origin - p x f
        let link_from_world = world_from_link.rotation.inverse();
        let force_link = link_from_world * wrench.force;
        let torque_origin = link_from_world * wrench.torque;
        let torque_sensor = torque_origin - self.local_pos.cross(&force_link);

        // --- 2. Mask and condition each triple independently ---
        let f = self.force_conditioning.apply(
            &mask_axes(&force_link, self.has_force),
            self.has_force,
            rng,
        )?;
        let t = self.torque_conditioning.apply(
            &mask_axes(&torque_sensor, self.has_torque),
            self.has_torque,
            rng,
        )?;

        self.f = f;
        self.t = t;
        Ok(())
    }

    fn simulate_kinematic(&mut self, world: &dyn KinematicProvider) -> Result<(), SensorError> {
        self.validate(world.num_links())?;
        // Constraint forces only exist after a dynamics solve.
        warn!(
            link = self.link.0,
            "force/torque sensor has no reading in kinematic mode, reporting zero"
        );
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.f = Vector3::zeros();
        self.t = Vector3::zeros();
    }

    fn measurement_names(&self) -> Vec<String> {
        let forces = AXES
            .iter()
            .zip(self.has_force)
            .filter(|(_, enabled)| *enabled)
            .map(|(axis, _)| format!("force_{axis}"));
        let torques = AXES
            .iter()
            .zip(self.has_torque)
            .filter(|(_, enabled)| *enabled)
            .map(|(axis, _)| format!("torque_{axis}"));
        forces.chain(torques).collect()
    }

    fn get_measurements(&self) -> Vec<f64> {
        let forces = (0..3).filter(|&i| self.has_force[i]).map(|i| self.f[i]);
        let torques = (0..3).filter(|&i| self.has_torque[i]).map(|i| self.t[i]);
        forces.chain(torques).collect()
    }

    fn set_measurements(&mut self, values: &[f64]) -> Result<(), SensorError> {
        check_measurement_len(self.enabled_count(), values)?;

        let mut f = Vector3::zeros();
        let mut t = Vector3::zeros();
        let mut it = values.iter().copied();
        for (i, enabled) in self.has_force.iter().enumerate() {
            if *enabled {
                f[i] = it.next().unwrap_or_default();
            }
        }
        for (i, enabled) in self.has_torque.iter().enumerate() {
            if *enabled {
                t[i] = it.next().unwrap_or_default();
            }
        }
        self.f = f;
        self.t = t;
        Ok(())
    }

    fn settings(&self) -> BTreeMap<String, String> {
        settings::settings_map(self, &Self::fields())
    }

    fn get_setting(&self, name: &str) -> Result<String, SensorError> {
        settings::get_by_name(self, &Self::fields(), Self::TYPE_NAME, name)
    }

    fn set_setting(&mut self, name: &str, value: &str) -> Result<(), SensorError> {
        settings::set_by_name(self, &Self::fields(), Self::TYPE_NAME, name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Wrench;
    use crate::scene::SceneSnapshot;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Isometry3, Translation3, UnitQuaternion};
    use std::f64::consts::FRAC_PI_2;

    const LINK: LinkHandle = LinkHandle(2);

    fn scene_with_wrench(force: Vector3<f64>, torque: Vector3<f64>) -> SceneSnapshot {
        let mut scene = SceneSnapshot::new(3);
        scene.set_joint_wrench(LINK, Wrench::new(force, torque));
        scene
    }

    #[test]
    fn test_masked_force_axes() {
        let mut sensor = ForceTorqueSensor {
            link: LINK,
            has_force: [true, true, false],
            ..Default::default()
        };
        let scene = scene_with_wrench(Vector3::new(3.0, -2.0, 7.0), Vector3::new(1.0, 1.0, 1.0));

        sensor.simulate(&scene, &mut SensorRng::seeded(0)).unwrap();

        assert_eq!(sensor.f, Vector3::new(3.0, -2.0, 0.0));
        assert_eq!(sensor.t, Vector3::zeros());
        assert_eq!(sensor.measurement_names(), vec!["force_x", "force_y"]);
        assert_eq!(sensor.get_measurements(), vec![3.0, -2.0]);
    }

    #[test]
    fn test_wrench_is_expressed_in_link_frame() {
        // Link yawed 90 degrees: world +X is link -Y.
        let mut scene = scene_with_wrench(Vector3::new(5.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 2.0));
        scene.set_link_pose(
            LINK,
            Isometry3::from_parts(
                Translation3::new(1.0, 2.0, 3.0),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            ),
        );
        let mut sensor = ForceTorqueSensor::six_axis(LINK, Vector3::zeros());

        sensor.simulate(&scene, &mut SensorRng::seeded(0)).unwrap();

        assert_abs_diff_eq!(sensor.f, Vector3::new(0.0, -5.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(sensor.t, Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn test_torque_is_taken_about_sensor_point() {
        // A pure +Z force at the link origin produces torque about an offset point.
        let scene = scene_with_wrench(Vector3::new(0.0, 0.0, 10.0), Vector3::zeros());
        let mut sensor = ForceTorqueSensor::six_axis(LINK, Vector3::new(0.1, 0.0, 0.0));

        sensor.simulate(&scene, &mut SensorRng::seeded(0)).unwrap();

        // tau = -p x f = -(0.1, 0, 0) x (0, 0, 10) = (0, 1, 0)
        assert_abs_diff_eq!(sensor.t, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(sensor.f, Vector3::new(0.0, 0.0, 10.0), epsilon = 1e-12);
    }

    #[test]
    fn test_parent_feels_the_reaction() {
        let wrench = Wrench::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(-1.0, 0.0, 0.5));
        let mut on_child = SceneSnapshot::new(3);
        on_child.set_joint_wrench(LINK, wrench);
        let mut on_parent = SceneSnapshot::new(3);
        on_parent.set_joint_wrench(LINK, wrench.reaction());

        let mut child = ForceTorqueSensor::six_axis(LINK, Vector3::zeros());
        let mut parent = child.clone();
        child.simulate(&on_child, &mut SensorRng::seeded(0)).unwrap();
        parent.simulate(&on_parent, &mut SensorRng::seeded(0)).unwrap();

        assert_eq!(child.f, -parent.f);
        assert_eq!(child.t, -parent.t);
    }

    #[test]
    fn test_force_and_torque_are_conditioned_separately() {
        let mut sensor = ForceTorqueSensor::six_axis(LINK, Vector3::zeros());
        sensor.force_conditioning.saturation = Vector3::repeat(4.0);
        sensor.torque_conditioning.resolution = Vector3::repeat(0.5);
        let scene = scene_with_wrench(Vector3::new(10.0, -10.0, 1.0), Vector3::new(0.7, 0.2, -1.3));

        sensor.simulate(&scene, &mut SensorRng::seeded(0)).unwrap();

        assert_eq!(sensor.f, Vector3::new(4.0, -4.0, 1.0));
        assert_abs_diff_eq!(sensor.t, Vector3::new(0.5, 0.0, -1.5), epsilon = 1e-12);
    }

    #[test]
    fn test_missing_wrench_reads_zero() {
        let mut sensor = ForceTorqueSensor::six_axis(LINK, Vector3::zeros());
        sensor.f = Vector3::repeat(3.0);
        sensor
            .simulate(&SceneSnapshot::new(3), &mut SensorRng::seeded(0))
            .unwrap();
        assert_eq!(sensor.f, Vector3::zeros());
        assert_eq!(sensor.t, Vector3::zeros());
    }

    #[test]
    fn test_kinematic_mode_reports_zero() {
        let mut sensor = ForceTorqueSensor::six_axis(LINK, Vector3::zeros());
        sensor.f = Vector3::repeat(1.0);
        sensor.t = Vector3::repeat(1.0);

        sensor.simulate_kinematic(&SceneSnapshot::new(3)).unwrap();

        assert_eq!(sensor.get_measurements(), vec![0.0; 6]);
    }

    #[test]
    fn test_invalid_link_in_kinematic_mode() {
        let mut sensor = ForceTorqueSensor::six_axis(LinkHandle(3), Vector3::zeros());
        let err = sensor.simulate_kinematic(&SceneSnapshot::new(3)).unwrap_err();
        assert_eq!(err, SensorError::InvalidLink { link: 3, num_links: 3 });
    }

    #[test]
    fn test_measurement_round_trip_and_length_check() {
        let mut sensor = ForceTorqueSensor {
            link: LINK,
            has_force: [false, true, true],
            has_torque: [true, false, false],
            ..Default::default()
        };
        assert_eq!(
            sensor.measurement_names(),
            vec!["force_y", "force_z", "torque_x"]
        );

        sensor.set_measurements(&[1.5, -2.5, 0.25]).unwrap();
        assert_eq!(sensor.f, Vector3::new(0.0, 1.5, -2.5));
        assert_eq!(sensor.t, Vector3::new(0.25, 0.0, 0.0));
        assert_eq!(sensor.get_measurements(), vec![1.5, -2.5, 0.25]);

        let before = sensor.clone();
        assert!(sensor.set_measurements(&[1.0; 4]).is_err());
        assert!(sensor.set_measurements(&[]).is_err());
        assert_eq!(sensor, before);
    }

    #[test]
    fn test_settings_round_trip() {
        let mut sensor = ForceTorqueSensor::default();
        sensor.set_setting("link", "2").unwrap();
        sensor.set_setting("localPos", "0 0.05 -0.1").unwrap();
        sensor.set_setting("hasTorque", "0 0 1").unwrap();
        sensor.set_setting("tSaturation", "1.5 1.5 1.5").unwrap();

        assert_eq!(sensor.link, LINK);
        assert_eq!(sensor.local_pos, Vector3::new(0.0, 0.05, -0.1));
        assert_eq!(sensor.has_torque, [false, false, true]);
        assert_eq!(sensor.get_setting("tSaturation").unwrap(), "1.5 1.5 1.5");
        assert_eq!(sensor.settings().len(), 10);

        assert!(sensor.set_setting("patchMin", "0 0").is_err());
        assert!(sensor.set_setting("tVariance", "-1 0 0").is_err());
    }
}
