// haptic_core/src/settings.rs

//! Named, string-valued access to sensor configuration.
//!
//! Every sensor publishes a fixed table of [`SettingField`]s. The table is the
//! only place a setting name is spelled out, so the map returned by
//! [`settings_map`] and the by-name accessors can never disagree.
//!
//! Value formats:
//! - scalars: plain decimal (`inf` is accepted and produced for unbounded limits)
//! - vectors: space-separated components, e.g. `"0 0.5 -1"`
//! - axis flags: space-separated `0`/`1`, e.g. `"1 1 0"`
//! - rigid transforms: 9 row-major rotation entries followed by 3 translation entries

use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, UnitQuaternion, Vector2, Vector3};
use std::collections::BTreeMap;

use crate::error::SensorError;

/// One named configuration field of sensor type `S`.
pub struct SettingField<S> {
    pub name: &'static str,
    pub get: fn(&S) -> String,
    pub set: fn(&mut S, &str) -> Result<(), SensorError>,
}

/// Renders every field in the table.
pub fn settings_map<S>(sensor: &S, fields: &[SettingField<S>]) -> BTreeMap<String, String> {
    fields
        .iter()
        .map(|f| (f.name.to_string(), (f.get)(sensor)))
        .collect()
}

pub fn get_by_name<S>(
    sensor: &S,
    fields: &[SettingField<S>],
    sensor_type: &'static str,
    name: &str,
) -> Result<String, SensorError> {
    fields
        .iter()
        .find(|f| f.name == name)
        .map(|f| (f.get)(sensor))
        .ok_or_else(|| SensorError::UnknownSetting {
            sensor: sensor_type,
            name: name.to_string(),
        })
}

/// Parses and stores one field. On error the sensor is left unchanged.
pub fn set_by_name<S>(
    sensor: &mut S,
    fields: &[SettingField<S>],
    sensor_type: &'static str,
    name: &str,
    value: &str,
) -> Result<(), SensorError> {
    let field = fields
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| SensorError::UnknownSetting {
            sensor: sensor_type,
            name: name.to_string(),
        })?;
    (field.set)(sensor, value)
}

// =========================================================================
// == Parsing ==
// =========================================================================

fn parse_numbers(name: &str, value: &str, count: usize) -> Result<Vec<f64>, SensorError> {
    let numbers = value
        .split_whitespace()
        .map(|tok| tok.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SensorError::invalid_value(name, value, e.to_string()))?;
    if numbers.len() != count {
        return Err(SensorError::invalid_value(
            name,
            value,
            format!("expected {count} numbers, found {}", numbers.len()),
        ));
    }
    Ok(numbers)
}

pub fn parse_scalar(name: &str, value: &str) -> Result<f64, SensorError> {
    Ok(parse_numbers(name, value, 1)?[0])
}

/// A non-negative scalar (`inf` allowed).
pub fn parse_non_negative(name: &str, value: &str) -> Result<f64, SensorError> {
    let x = parse_scalar(name, value)?;
    if x.is_nan() || x < 0.0 {
        return Err(SensorError::invalid_value(name, value, "must be non-negative"));
    }
    Ok(x)
}

pub fn parse_index(name: &str, value: &str) -> Result<usize, SensorError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|e| SensorError::invalid_value(name, value, e.to_string()))
}

pub fn parse_vector2(name: &str, value: &str) -> Result<Vector2<f64>, SensorError> {
    let n = parse_numbers(name, value, 2)?;
    Ok(Vector2::new(n[0], n[1]))
}

pub fn parse_vector3(name: &str, value: &str) -> Result<Vector3<f64>, SensorError> {
    let n = parse_numbers(name, value, 3)?;
    Ok(Vector3::new(n[0], n[1], n[2]))
}

/// A 3-vector whose components must all be `>= 0` (`inf` allowed).
pub fn parse_non_negative_vector3(name: &str, value: &str) -> Result<Vector3<f64>, SensorError> {
    let v = parse_vector3(name, value)?;
    if v.iter().any(|x| x.is_nan() || *x < 0.0) {
        return Err(SensorError::invalid_value(
            name,
            value,
            "components must be non-negative",
        ));
    }
    Ok(v)
}

pub fn parse_flags(name: &str, value: &str) -> Result<[bool; 3], SensorError> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(SensorError::invalid_value(
            name,
            value,
            format!("expected 3 flags, found {}", tokens.len()),
        ));
    }
    let mut flags = [false; 3];
    for (flag, tok) in flags.iter_mut().zip(tokens) {
        *flag = match tok {
            "1" | "true" => true,
            "0" | "false" => false,
            other => {
                return Err(SensorError::invalid_value(
                    name,
                    value,
                    format!("'{other}' is not a flag"),
                ))
            }
        };
    }
    Ok(flags)
}

pub fn parse_isometry(name: &str, value: &str) -> Result<Isometry3<f64>, SensorError> {
    let n = parse_numbers(name, value, 12)?;
    let matrix = Matrix3::from_row_slice(&n[..9]);
    // Only proper rotations are accepted.
    let orthonormal = (matrix.transpose() * matrix - Matrix3::identity()).abs().max() <= 1e-6;
    if !orthonormal || (matrix.determinant() - 1.0).abs() > 1e-6 {
        return Err(SensorError::invalid_value(
            name,
            value,
            "rotation block is not a proper rotation",
        ));
    }
    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(matrix));
    Ok(Isometry3::from_parts(
        Translation3::new(n[9], n[10], n[11]),
        rotation,
    ))
}

// =========================================================================
// == Formatting ==
// =========================================================================

pub fn format_vector2(v: &Vector2<f64>) -> String {
    format!("{} {}", v.x, v.y)
}

pub fn format_vector3(v: &Vector3<f64>) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}

pub fn format_flags(flags: &[bool; 3]) -> String {
    flags
        .iter()
        .map(|f| if *f { "1" } else { "0" })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_isometry(iso: &Isometry3<f64>) -> String {
    let r = iso.rotation.to_rotation_matrix();
    let m = r.matrix();
    let t = iso.translation.vector;
    let mut parts = Vec::with_capacity(12);
    for row in 0..3 {
        for col in 0..3 {
            parts.push(m[(row, col)].to_string());
        }
    }
    parts.extend([t.x, t.y, t.z].iter().map(|x| x.to_string()));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[derive(Default)]
    struct Gauge {
        gain: f64,
        offset: Vector3<f64>,
    }

    fn gauge_fields() -> [SettingField<Gauge>; 2] {
        [
            SettingField {
                name: "gain",
                get: |p| p.gain.to_string(),
                set: |p, v| {
                    p.gain = parse_non_negative("gain", v)?;
                    Ok(())
                },
            },
            SettingField {
                name: "offset",
                get: |p| format_vector3(&p.offset),
                set: |p, v| {
                    p.offset = parse_vector3("offset", v)?;
                    Ok(())
                },
            },
        ]
    }

    #[test]
    fn test_table_drives_map_and_accessors() {
        let mut gauge = Gauge::default();
        let fields = gauge_fields();
        set_by_name(&mut gauge, &fields, "Gauge", "gain", "2.5").unwrap();
        set_by_name(&mut gauge, &fields, "Gauge", "offset", "1 -2 0.5").unwrap();

        let map = settings_map(&gauge, &fields);
        assert_eq!(map.len(), 2);
        assert_eq!(map["gain"], "2.5");
        assert_eq!(map["offset"], "1 -2 0.5");
        assert_eq!(get_by_name(&gauge, &fields, "Gauge", "gain").unwrap(), "2.5");
    }

    #[test]
    fn test_unknown_name_is_reported() {
        let mut gauge = Gauge::default();
        let fields = gauge_fields();
        let err = set_by_name(&mut gauge, &fields, "Gauge", "bias", "1").unwrap_err();
        assert_eq!(
            err,
            SensorError::UnknownSetting {
                sensor: "Gauge",
                name: "bias".to_string()
            }
        );
        assert!(get_by_name(&gauge, &fields, "Gauge", "bias").is_err());
    }

    #[test]
    fn test_bad_value_leaves_field_unchanged() {
        let mut gauge = Gauge {
            gain: 1.0,
            ..Default::default()
        };
        let fields = gauge_fields();
        assert!(set_by_name(&mut gauge, &fields, "Gauge", "gain", "-3").is_err());
        assert!(set_by_name(&mut gauge, &fields, "Gauge", "gain", "fast").is_err());
        assert_eq!(gauge.gain, 1.0);
    }

    #[test]
    fn test_infinity_round_trips() {
        let v = Vector3::repeat(f64::INFINITY);
        let text = format_vector3(&v);
        assert_eq!(text, "inf inf inf");
        assert_eq!(parse_non_negative_vector3("sat", &text).unwrap(), v);
    }

    #[test]
    fn test_flags() {
        assert_eq!(parse_flags("f", "1 0 1").unwrap(), [true, false, true]);
        assert_eq!(parse_flags("f", "true false false").unwrap(), [true, false, false]);
        assert_eq!(format_flags(&[false, true, true]), "0 1 1");
        assert!(parse_flags("f", "1 1").is_err());
        assert!(parse_flags("f", "1 2 0").is_err());
    }

    #[test]
    fn test_isometry_round_trip() {
        let rotations = [
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 170f64.to_radians()),
            UnitQuaternion::from_euler_angles(0.3, -1.1, 2.4),
        ];
        for rotation in rotations {
            let iso = Isometry3::from_parts(Translation3::new(0.1, -0.2, 0.3), rotation);
            let back = parse_isometry("T", &format_isometry(&iso)).unwrap();
            assert_abs_diff_eq!(back.translation.vector, iso.translation.vector, epsilon = 1e-12);
            assert_abs_diff_eq!(
                back.rotation.to_rotation_matrix().into_inner(),
                iso.rotation.to_rotation_matrix().into_inner(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_isometry_rejects_non_rotation() {
        let skewed = "2 0 0 0 1 0 0 0 1 0 0 0";
        assert!(parse_isometry("T", skewed).is_err());
        let mirrored = "-1 0 0 0 1 0 0 0 1 0 0 0";
        assert!(parse_isometry("T", mirrored).is_err());
        assert!(parse_isometry("T", "1 0 0 0 1 0 0 0 1").is_err());
    }
}
