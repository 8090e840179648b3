// haptic_core/src/geometry.rs

use nalgebra::{Isometry3, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::SensorError;

// =========================================================================
// == Contact Patch ==
// =========================================================================

/// An axis-aligned rectangle in the sensor's local X-Y plane.
///
/// `min` and `max` are public so configuration can be edited field by field;
/// call [`PatchRect::validate`] before using a rectangle that was built that way.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PatchRect {
    pub min: Vector2<f64>,
    pub max: Vector2<f64>,
}

impl PatchRect {
    /// Creates a rectangle, rejecting `min > max` on either axis.
    pub fn new(min: Vector2<f64>, max: Vector2<f64>) -> Result<Self, SensorError> {
        let rect = Self { min, max };
        rect.validate()?;
        Ok(rect)
    }

    /// A rectangle of the given full width and height centred on the sensor origin.
    pub fn centered(width: f64, height: f64) -> Result<Self, SensorError> {
        Self::new(
            Vector2::new(-0.5 * width, -0.5 * height),
            Vector2::new(0.5 * width, 0.5 * height),
        )
    }

    pub fn validate(&self) -> Result<(), SensorError> {
        for (i, axis) in ['x', 'y'].into_iter().enumerate() {
            // NaN bounds fail this comparison too.
            if !(self.min[i] <= self.max[i]) {
                return Err(SensorError::MalformedPatch {
                    axis,
                    min: self.min[i],
                    max: self.max[i],
                });
            }
        }
        Ok(())
    }

    pub fn center(&self) -> Vector2<f64> {
        (self.min + self.max) * 0.5
    }

    /// Full extent along X and Y.
    pub fn size(&self) -> Vector2<f64> {
        self.max - self.min
    }

    /// Inclusive containment test; points on the border are inside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y
    }

    /// Edge attenuation weight for a contact at local `(x, y)`.
    ///
    /// With `falloff == 0` every point weighs 1. Otherwise the weight is
    /// `(1 - 4|dx||dy| / (sx * sy))^falloff` where `(dx, dy)` is the offset from
    /// the patch centre and `(sx, sy)` the patch size: 1 at the centre and 0 at
    /// the four corners. A degenerate patch with zero area has no corners to
    /// attenuate toward and weighs every point 1.
    pub fn falloff_weight(&self, x: f64, y: f64, falloff: f64) -> f64 {
        if falloff == 0.0 {
            return 1.0;
        }
        let size = self.size();
        if size.x <= 0.0 || size.y <= 0.0 {
            return 1.0;
        }
        let center = self.center();
        let u = (x - center.x).abs() / size.x;
        let v = (y - center.y).abs() / size.y;
        (1.0 - 4.0 * u * v).max(0.0).powf(falloff)
    }
}

// =========================================================================
// == Patch Volume (kinematic penetration queries) ==
// =========================================================================

/// The sensing region of a contact patch as an oriented box in the world:
/// the patch rectangle extruded by `tolerance` on both sides of the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchVolume {
    /// Pose of the sensor frame in the world.
    pub world_from_sensor: Isometry3<f64>,
    pub rect: PatchRect,
    pub tolerance: f64,
}

impl PatchVolume {
    pub fn new(world_from_sensor: Isometry3<f64>, rect: PatchRect, tolerance: f64) -> Self {
        Self {
            world_from_sensor,
            rect,
            tolerance,
        }
    }

    /// Box centre in sensor coordinates.
    pub fn local_center(&self) -> Point3<f64> {
        let c = self.rect.center();
        Point3::new(c.x, c.y, 0.0)
    }

    pub fn half_extents(&self) -> Vector3<f64> {
        let s = self.rect.size();
        Vector3::new(0.5 * s.x, 0.5 * s.y, self.tolerance.max(0.0))
    }

    pub fn world_center(&self) -> Point3<f64> {
        self.world_from_sensor * self.local_center()
    }

    /// Closest point of the box to `point`, both in world coordinates.
    pub fn closest_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let local = self.world_from_sensor.inverse_transform_point(point);
        let center = self.local_center();
        let h = self.half_extents();
        let clamped = Point3::new(
            local.x.clamp(center.x - h.x, center.x + h.x),
            local.y.clamp(center.y - h.y, center.y + h.y),
            local.z.clamp(center.z - h.z, center.z + h.z),
        );
        self.world_from_sensor * clamped
    }

    /// Support radius of the box projected onto a world direction.
    fn projected_radius(&self, direction: &Vector3<f64>) -> f64 {
        let local_dir = self.world_from_sensor.rotation.inverse() * direction;
        let h = self.half_extents();
        h.x * local_dir.x.abs() + h.y * local_dir.y.abs() + h.z * local_dir.z.abs()
    }
}

// =========================================================================
// == World Obstacles ==
// =========================================================================

/// Static world geometry the kinematic contact query tests against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Obstacle {
    Sphere {
        center: Point3<f64>,
        radius: f64,
    },
    /// Everything on the side of the plane opposite to `normal` is solid.
    HalfSpace {
        point: Point3<f64>,
        normal: Vector3<f64>,
    },
}

impl Obstacle {
    /// True if the obstacle overlaps the patch volume with non-zero depth.
    pub fn penetrates(&self, volume: &PatchVolume) -> bool {
        match self {
            Obstacle::Sphere { center, radius } => {
                let closest = volume.closest_point(center);
                (closest - center).norm_squared() < radius * radius
            }
            Obstacle::HalfSpace { point, normal } => {
                let n = match normal.try_normalize(f64::EPSILON) {
                    Some(n) => n,
                    None => return false,
                };
                let signed_distance = (volume.world_center() - point).dot(&n);
                signed_distance - volume.projected_radius(&n) < 0.0
            }
        }
    }
}
