// haptic_core/src/models/conditioning.rs

use nalgebra::Vector3;
use num_traits::Float;
use rand_distr::{Distribution, Normal};

use crate::error::SensorError;
use crate::prng::SensorRng;

/// Per-axis post-processing shared by every sensor that reports a 3-vector.
///
/// Applied to each enabled axis in a fixed order: additive Gaussian noise,
/// quantization to `resolution`, then clamping to `±saturation`. Clamping
/// runs last so neither noise nor rounding can pull a saturated reading back
/// inside the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalConditioning {
    /// Quantization step per axis. Zero disables quantization.
    pub resolution: Vector3<f64>,
    /// Variance of the additive zero-mean Gaussian noise per axis.
    pub variance: Vector3<f64>,
    /// Largest reportable magnitude per axis.
    pub saturation: Vector3<f64>,
}

impl Default for SignalConditioning {
    fn default() -> Self {
        Self {
            resolution: Vector3::zeros(),
            variance: Vector3::zeros(),
            saturation: Vector3::repeat(f64::INFINITY),
        }
    }
}

impl SignalConditioning {
    /// Checks that every parameter is non-negative.
    pub fn validate(&self) -> Result<(), SensorError> {
        check_non_negative("resolution", &self.resolution)?;
        check_non_negative("variance", &self.variance)?;
        check_non_negative("saturation", &self.saturation)?;
        Ok(())
    }

    /// Runs the full chain on `raw`. Axes with `mask[i] == false` come out as
    /// exactly zero and draw no noise sample.
    pub fn apply(
        &self,
        raw: &Vector3<f64>,
        mask: [bool; 3],
        rng: &mut SensorRng,
    ) -> Result<Vector3<f64>, SensorError> {
        self.validate()?;

        let mut out = Vector3::zeros();
        for i in 0..3 {
            if !mask[i] {
                continue;
            }
            let mut value = raw[i];
            if self.variance[i] > 0.0 {
                let noise = Normal::new(0.0, self.variance[i].sqrt()).map_err(|e| {
                    SensorError::InvalidParameter {
                        name: "variance",
                        reason: e.to_string(),
                    }
                })?;
                value += noise.sample(&mut rng.0);
            }
            value = quantize(value, self.resolution[i]);
            out[i] = saturate(value, self.saturation[i]);
        }
        Ok(out)
    }
}

/// Rounds `value` to the nearest multiple of `resolution`; a non-positive
/// resolution leaves the value untouched.
pub fn quantize<T: Float>(value: T, resolution: T) -> T {
    if resolution > T::zero() {
        (value / resolution).round() * resolution
    } else {
        value
    }
}

/// Clamps `value` into `[-limit, +limit]`.
pub fn saturate<T: Float>(value: T, limit: T) -> T {
    value.max(-limit).min(limit)
}

/// Zeroes every axis whose flag is off.
pub fn mask_axes(v: &Vector3<f64>, mask: [bool; 3]) -> Vector3<f64> {
    Vector3::new(
        if mask[0] { v.x } else { 0.0 },
        if mask[1] { v.y } else { 0.0 },
        if mask[2] { v.z } else { 0.0 },
    )
}

fn check_non_negative(name: &'static str, v: &Vector3<f64>) -> Result<(), SensorError> {
    if v.iter().any(|x| x.is_nan() || *x < 0.0) {
        return Err(SensorError::InvalidParameter {
            name,
            reason: format!("expected non-negative values, got [{} {} {}]", v.x, v.y, v.z),
        });
    }
    Ok(())
}
