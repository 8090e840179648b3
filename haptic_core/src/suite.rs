// haptic_core/src/suite.rs

use tracing::warn;

use crate::error::SensorError;
use crate::models::sensors::{create_sensor, PhysicalSensor};
use crate::prng::SensorRng;
use crate::providers::{KinematicProvider, PhysicsProvider};

/// The measurements of one sensor after a step.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub sensor: String,
    pub values: Vec<f64>,
}

/// A named set of sensors stepped together, in registration order.
///
/// A sensor that fails a step keeps its previous measurement and does not
/// stop the others from being simulated.
#[derive(Debug, Clone, Default)]
pub struct SensorSuite {
    sensors: Vec<(String, Box<dyn PhysicalSensor>)>,
}

impl SensorSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        sensor: Box<dyn PhysicalSensor>,
    ) -> Result<(), SensorError> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(SensorError::DuplicateSensor(name));
        }
        self.sensors.push((name, sensor));
        Ok(())
    }

    /// Creates a sensor by type name and applies `settings` in order.
    pub fn add_from_settings<'a>(
        &mut self,
        name: impl Into<String>,
        type_name: &str,
        settings: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<(), SensorError> {
        let mut sensor = create_sensor(type_name)?;
        for (key, value) in settings {
            sensor.set_setting(key, value)?;
        }
        self.add(name, sensor)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sensors.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&dyn PhysicalSensor> {
        self.sensors
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn PhysicalSensor>> {
        self.sensors
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// Typed access to a registered sensor.
    pub fn get_as<T: PhysicalSensor>(&self, name: &str) -> Option<&T> {
        self.get(name)?.downcast_ref::<T>()
    }

    /// Checks every sensor against a robot with `num_links` links.
    pub fn validate(&self, num_links: usize) -> Vec<(String, SensorError)> {
        self.sensors
            .iter()
            .filter_map(|(name, s)| s.validate(num_links).err().map(|e| (name.clone(), e)))
            .collect()
    }

    /// Runs one dynamics step on every sensor and returns the failures.
    pub fn simulate(
        &mut self,
        physics: &dyn PhysicsProvider,
        rng: &mut SensorRng,
    ) -> Vec<(String, SensorError)> {
        let mut failures = Vec::new();
        for (name, sensor) in &mut self.sensors {
            if let Err(e) = sensor.simulate(physics, rng) {
                warn!("sensor '{}' failed to simulate: {}", name, e);
                failures.push((name.clone(), e));
            }
        }
        failures
    }

    /// Runs one kinematic step on every sensor and returns the failures.
    pub fn simulate_kinematic(
        &mut self,
        world: &dyn KinematicProvider,
    ) -> Vec<(String, SensorError)> {
        let mut failures = Vec::new();
        for (name, sensor) in &mut self.sensors {
            if let Err(e) = sensor.simulate_kinematic(world) {
                warn!("sensor '{}' failed kinematic simulation: {}", name, e);
                failures.push((name.clone(), e));
            }
        }
        failures
    }

    pub fn reset(&mut self) {
        for (_, sensor) in &mut self.sensors {
            sensor.reset();
        }
    }

    pub fn readings(&self) -> Vec<SensorReading> {
        self.sensors
            .iter()
            .map(|(name, s)| SensorReading {
                sensor: name.clone(),
                values: s.get_measurements(),
            })
            .collect()
    }

    /// Qualified names of every reported value, `"<sensor>.<measurement>"`.
    pub fn measurement_names(&self) -> Vec<String> {
        self.sensors
            .iter()
            .flat_map(|(name, s)| {
                s.measurement_names()
                    .into_iter()
                    .map(move |m| format!("{name}.{m}"))
            })
            .collect()
    }

    /// Injects a recorded measurement into one sensor.
    pub fn set_measurements(&mut self, name: &str, values: &[f64]) -> Result<(), SensorError> {
        self.get_mut(name)
            .ok_or_else(|| SensorError::UnknownSensor(name.to_string()))?
            .set_measurements(values)
    }
}
