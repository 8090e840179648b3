// haptic_core/src/models/sensors/contact.rs

use nalgebra::{Isometry3, Vector2, Vector3};
use std::collections::BTreeMap;
use tracing::debug;

use super::{check_link, check_measurement_len, link_pose, PhysicalSensor, AXES};
use crate::error::SensorError;
use crate::geometry::{PatchRect, PatchVolume};
use crate::models::conditioning::{mask_axes, SignalConditioning};
use crate::prng::SensorRng;
use crate::providers::{KinematicProvider, PhysicsProvider};
use crate::settings::{self, SettingField};
use crate::types::LinkHandle;

/// A tactile sensor: a rectangular patch on a link's surface that reports
/// whether it is touched and, optionally, up to three axes of force.
///
/// The sensor frame has its origin on the surface with local Z pointing out of
/// the link. A contact counts when its local (x, y) lies inside the patch and
/// its local z is within `patch_tolerance` of the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactPatchSensor {
    // --- Configuration ---
    pub link: LinkHandle,
    /// Pose of the sensor frame in the link frame.
    pub local_frame: Isometry3<f64>,
    pub patch: PatchRect,
    pub patch_tolerance: f64,
    /// Which force axes are reported.
    pub has_force: [bool; 3],
    pub conditioning: SignalConditioning,
    /// Minimum normal force needed to register contact.
    pub sensitivity: f64,
    /// Edge attenuation exponent; zero makes the whole patch a rigid gauge.
    pub falloff_coefficient: f64,

    // --- Measurement ---
    pub contact: bool,
    /// Force on the patch in the sensor frame.
    pub force: Vector3<f64>,
}

impl Default for ContactPatchSensor {
    fn default() -> Self {
        Self {
            link: LinkHandle(0),
            local_frame: Isometry3::identity(),
            patch: PatchRect::default(),
            patch_tolerance: 0.001,
            has_force: [false; 3],
            conditioning: SignalConditioning::default(),
            sensitivity: 0.0,
            falloff_coefficient: 0.0,
            contact: false,
            force: Vector3::zeros(),
        }
    }
}

impl ContactPatchSensor {
    pub const TYPE_NAME: &'static str = "ContactSensor";

    /// A sensor on `link` with the given patch and all other settings at their defaults.
    pub fn new(
        link: LinkHandle,
        local_frame: Isometry3<f64>,
        patch: PatchRect,
    ) -> Result<Self, SensorError> {
        patch.validate()?;
        Ok(Self {
            link,
            local_frame,
            patch,
            ..Default::default()
        })
    }

    /// Replaces both patch corners at once, so a patch can be moved anywhere
    /// without passing through an invalid intermediate rectangle.
    pub fn set_patch(&mut self, min: Vector2<f64>, max: Vector2<f64>) -> Result<(), SensorError> {
        self.patch = PatchRect::new(min, max)?;
        Ok(())
    }

    /// Checks every parameter that does not depend on the robot.
    fn validate_parameters(&self) -> Result<(), SensorError> {
        self.patch.validate()?;
        self.conditioning.validate()?;
        if self.patch_tolerance.is_nan() || self.patch_tolerance < 0.0 {
            return Err(SensorError::InvalidParameter {
                name: "patchTolerance",
                reason: format!("must be non-negative, got {}", self.patch_tolerance),
            });
        }
        if self.falloff_coefficient.is_nan() || self.falloff_coefficient < 0.0 {
            return Err(SensorError::InvalidParameter {
                name: "falloffCoefficient",
                reason: format!("must be non-negative, got {}", self.falloff_coefficient),
            });
        }
        Ok(())
    }

    fn fields() -> [SettingField<Self>; 11] {
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
                name: "localFrame",
                get: |s| settings::format_isometry(&s.local_frame),
                set: |s, v| {
                    s.local_frame = settings::parse_isometry("localFrame", v)?;
                    Ok(())
                },
            },
            // The corners are stored independently; the rectangle is checked
            // when the sensor is validated or simulated.
            SettingField {
                name: "patchMin",
                get: |s| settings::format_vector2(&s.patch.min),
                set: |s, v| {
                    s.patch.min = settings::parse_vector2("patchMin", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "patchMax",
                get: |s| settings::format_vector2(&s.patch.max),
                set: |s, v| {
                    s.patch.max = settings::parse_vector2("patchMax", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "patchTolerance",
                get: |s| s.patch_tolerance.to_string(),
                set: |s, v| {
                    s.patch_tolerance = settings::parse_non_negative("patchTolerance", v)?;
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
                name: "fResolution",
                get: |s| settings::format_vector3(&s.conditioning.resolution),
                set: |s, v| {
                    s.conditioning.resolution =
                        settings::parse_non_negative_vector3("fResolution", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "fVariance",
                get: |s| settings::format_vector3(&s.conditioning.variance),
                set: |s, v| {
                    s.conditioning.variance = settings::parse_non_negative_vector3("fVariance", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "fSensitivity",
                get: |s| s.sensitivity.to_string(),
                set: |s, v| {
                    s.sensitivity = settings::parse_scalar("fSensitivity", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "fSaturation",
                get: |s| settings::format_vector3(&s.conditioning.saturation),
                set: |s, v| {
                    s.conditioning.saturation =
                        settings::parse_non_negative_vector3("fSaturation", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "falloffCoefficient",
                get: |s| s.falloff_coefficient.to_string(),
                set: |s, v| {
                    s.falloff_coefficient = settings::parse_non_negative("falloffCoefficient", v)?;
                    Ok(())
                },
            },
        ]
    }
}

impl PhysicalSensor for ContactPatchSensor {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn link(&self) -> LinkHandle {
        self.link
    }

    fn validate(&self, num_links: usize) -> Result<(), SensorError> {
        check_link(self.link, num_links)?;
        self.validate_parameters()
    }

    fn simulate(
        &mut self,
        physics: &dyn PhysicsProvider,
        rng: &mut SensorRng,
    ) -> Result<(), SensorError> {
        self.validate(physics.num_links())?;
        let world_from_link = link_pose(physics, self.link)?;
        let sensor_from_world = (world_from_link * self.local_frame).inverse();

        // --- 1. Aggregate the weighted contact forces that land on the patch ---
        let mut raw_force = Vector3::zeros();
        let mut accepted = 0usize;
        for contact in physics.contacts(self.link) {
            let local = sensor_from_world * contact.position;
            if local.z.abs() > self.patch_tolerance || !self.patch.contains(local.x, local.y) {
                continue;
            }
            let weight = self
                .patch
                .falloff_weight(local.x, local.y, self.falloff_coefficient);
            raw_force += weight * (sensor_from_world.rotation * contact.force);
            accepted += 1;
        }

        // --- 2. Threshold on the normal component before any axis is dropped ---
        let contact = raw_force.z > self.sensitivity;

        // --- 3. Mask, add noise, quantize, saturate ---
        let force = self
            .conditioning
            .apply(&mask_axes(&raw_force, self.has_force), self.has_force, rng)?;

        debug!(
            link = self.link.0,
            accepted,
            contact,
            "contact patch: normal force {:.4}",
            raw_force.z
        );

        self.contact = contact;
        self.force = force;
        Ok(())
    }

    fn simulate_kinematic(&mut self, world: &dyn KinematicProvider) -> Result<(), SensorError> {
        self.validate(world.num_links())?;
        let world_from_link = link_pose(world, self.link)?;
        let volume = PatchVolume::new(
            world_from_link * self.local_frame,
            self.patch,
            self.patch_tolerance,
        );

        // No constraint forces exist without a dynamics solve.
        self.contact = world.penetrates(self.link, &volume);
        self.force = Vector3::zeros();
        debug!(link = self.link.0, contact = self.contact, "contact patch (kinematic)");
        Ok(())
    }

    fn reset(&mut self) {
        self.contact = false;
        self.force = Vector3::zeros();
    }

    fn measurement_names(&self) -> Vec<String> {
        let mut names = vec!["contact".to_string()];
        names.extend(
            AXES.iter()
                .zip(self.has_force)
                .filter(|(_, enabled)| *enabled)
                .map(|(axis, _)| format!("force_{axis}")),
        );
        names
    }

    fn get_measurements(&self) -> Vec<f64> {
        let mut values = vec![if self.contact { 1.0 } else { 0.0 }];
        values.extend((0..3).filter(|&i| self.has_force[i]).map(|i| self.force[i]));
        values
    }

    fn set_measurements(&mut self, values: &[f64]) -> Result<(), SensorError> {
        let expected = 1 + self.has_force.iter().filter(|f| **f).count();
        check_measurement_len(expected, values)?;

        let mut force = Vector3::zeros();
        let enabled = (0..3).filter(|&i| self.has_force[i]);
        for (i, v) in enabled.zip(&values[1..]) {
            force[i] = *v;
        }
        self.contact = values[0] != 0.0;
        self.force = force;
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
