// haptic_core/src/models/sensors/mod.rs

use downcast_rs::{impl_downcast, Downcast};
use dyn_clone::DynClone;
use nalgebra::Isometry3;
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::SensorError;
use crate::prng::SensorRng;
use crate::providers::{KinematicProvider, PhysicsProvider, PoseProvider};
use crate::types::LinkHandle;

pub mod contact;
pub mod force_torque;

pub use contact::ContactPatchSensor;
pub use force_torque::ForceTorqueSensor;

// --- PHYSICAL SENSOR TRAIT ---
// A simulated sensor: raw engine data in, reported measurement vector out.
pub trait PhysicalSensor: DynClone + Downcast + Debug + Send + Sync {
    /// Stable type name, used by the sensor factory and in logs.
    fn type_name(&self) -> &'static str;

    /// The link this sensor is mounted on.
    fn link(&self) -> LinkHandle;

    /// Checks the configuration against a robot with `num_links` links.
    fn validate(&self, num_links: usize) -> Result<(), SensorError>;

    /// Computes a measurement from one dynamics step. Noise is drawn from `rng`.
    ///
    /// On error the previous measurement is kept.
    fn simulate(
        &mut self,
        physics: &dyn PhysicsProvider,
        rng: &mut SensorRng,
    ) -> Result<(), SensorError>;

    /// Computes a measurement from poses and geometry alone. Sensors that
    /// need constraint forces report zero here.
    fn simulate_kinematic(&mut self, world: &dyn KinematicProvider) -> Result<(), SensorError>;

    /// Clears the measurement. Configuration is untouched.
    fn reset(&mut self);

    /// Names of the reported values, in the order `get_measurements` emits them.
    fn measurement_names(&self) -> Vec<String>;

    fn get_measurements(&self) -> Vec<f64>;

    /// Overwrites the measurement from a recorded vector. The vector must have
    /// exactly as many entries as `measurement_names`; otherwise nothing changes.
    fn set_measurements(&mut self, values: &[f64]) -> Result<(), SensorError>;

    /// Every configuration field, rendered as text.
    fn settings(&self) -> BTreeMap<String, String>;

    fn get_setting(&self, name: &str) -> Result<String, SensorError>;

    fn set_setting(&mut self, name: &str, value: &str) -> Result<(), SensorError>;
}

// Generates `Clone` for `Box<dyn PhysicalSensor>` and typed downcasts.
dyn_clone::clone_trait_object!(PhysicalSensor);
impl_downcast!(PhysicalSensor);

/// Builds a default-configured sensor from its type name.
pub fn create_sensor(type_name: &str) -> Result<Box<dyn PhysicalSensor>, SensorError> {
    match type_name {
        ContactPatchSensor::TYPE_NAME => Ok(Box::new(ContactPatchSensor::default())),
        ForceTorqueSensor::TYPE_NAME => Ok(Box::new(ForceTorqueSensor::default())),
        other => Err(SensorError::UnknownSensorType(other.to_string())),
    }
}

/// Fails with [`SensorError::InvalidLink`] unless `link` indexes one of `num_links` links.
pub(crate) fn check_link(link: LinkHandle, num_links: usize) -> Result<(), SensorError> {
    if link.is_valid_for(num_links) {
        Ok(())
    } else {
        Err(SensorError::InvalidLink {
            link: link.0,
            num_links,
        })
    }
}

/// Looks up a link's world pose, turning a missing pose into an error.
pub(crate) fn link_pose<P: PoseProvider + ?Sized>(
    provider: &P,
    link: LinkHandle,
) -> Result<Isometry3<f64>, SensorError> {
    provider
        .link_pose(link)
        .ok_or(SensorError::MissingLinkPose { link: link.0 })
}

/// Fails unless `values` has exactly `expected` entries.
pub(crate) fn check_measurement_len(expected: usize, values: &[f64]) -> Result<(), SensorError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(SensorError::MeasurementLengthMismatch {
            expected,
            actual: values.len(),
        })
    }
}

pub(crate) const AXES: [char; 3] = ['x', 'y', 'z'];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_builds_known_types() {
        let contact = create_sensor("ContactSensor").unwrap();
        assert_eq!(contact.type_name(), "ContactSensor");
        assert!(contact.downcast_ref::<ContactPatchSensor>().is_some());

        let ft = create_sensor("ForceTorqueSensor").unwrap();
        assert_eq!(ft.type_name(), "ForceTorqueSensor");
        assert!(ft.downcast_ref::<ForceTorqueSensor>().is_some());
    }

    #[test]
    fn test_factory_rejects_unknown_types() {
        let err = create_sensor("Accelerometer").unwrap_err();
        assert_eq!(err, SensorError::UnknownSensorType("Accelerometer".into()));
    }

    #[test]
    fn test_boxed_sensors_clone_independently() {
        let original = create_sensor("ContactSensor").unwrap();
        let mut copy = original.clone();
        copy.set_setting("patchTolerance", "0.5").unwrap();
        assert_eq!(original.get_setting("patchTolerance").unwrap(), "0.001");
        assert_eq!(copy.get_setting("patchTolerance").unwrap(), "0.5");
    }
}
