// haptic_core/src/error.rs

use thiserror::Error;

/// Errors reported by sensor configuration and measurement operations.
///
/// None of these are fatal: each one is local to the sensor call that produced it.
#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum SensorError {
    /// The sensor is attached to a link that does not exist in the sensed robot.
    #[error("link {link} is out of range for a robot with {num_links} links")]
    InvalidLink { link: usize, num_links: usize },

    /// The contact patch rectangle has `min > max` on an axis.
    #[error("malformed contact patch: {axis} min {min} exceeds max {max}")]
    MalformedPatch { axis: char, min: f64, max: f64 },

    /// A by-name settings accessor was given a name the sensor does not know.
    #[error("{sensor} has no setting named '{name}'")]
    UnknownSetting { sensor: &'static str, name: String },

    /// A setting value could not be parsed or violates a parameter bound.
    #[error("invalid value '{value}' for setting '{name}': {reason}")]
    InvalidSettingValue {
        name: String,
        value: String,
        reason: String,
    },

    /// `set_measurements` was called with a vector that does not match the enabled axes.
    #[error("measurement vector has {actual} entries, expected {expected}")]
    MeasurementLengthMismatch { expected: usize, actual: usize },

    /// A numeric parameter is outside its allowed range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The physics or kinematics provider has no pose for a link it claims to have.
    #[error("no world pose available for link {link}")]
    MissingLinkPose { link: usize },

    /// The sensor factory does not know this type name.
    #[error("unknown sensor type '{0}'")]
    UnknownSensorType(String),

    /// A sensor with this name is already registered in the suite.
    #[error("a sensor named '{0}' is already registered")]
    DuplicateSensor(String),

    /// No sensor with this name is registered in the suite.
    #[error("no sensor named '{0}' is registered")]
    UnknownSensor(String),
}

impl SensorError {
    /// Builds an [`SensorError::InvalidSettingValue`] from borrowed parts.
    pub fn invalid_value(name: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSettingValue {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
