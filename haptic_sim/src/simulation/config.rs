// haptic_sim/src/simulation/config.rs

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use haptic_core::geometry::Obstacle;
use haptic_core::models::sensors::{ContactPatchSensor, ForceTorqueSensor};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::SimError;
use crate::simulation::serde_helpers;

/// Environment variables with this prefix override scenario values,
/// e.g. `HAPTIC_SIMULATION__SEED=7`.
pub const ENV_PREFIX: &str = "HAPTIC_";

/// The only keys the environment may override. Other `HAPTIC_*` variables are ignored.
pub const ENV_OVERRIDES: [&str; 4] = [
    "simulation.seed",
    "simulation.steps",
    "simulation.dt",
    "simulation.mode",
];

// =========================================================================
// == Top-Level Scenario ==
// =========================================================================

/// # ScenarioConfig
/// The root of the data parsed from a `scenario.toml` file.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)] // Use default if the [simulation] section is missing
    pub simulation: Simulation,

    #[serde(default)]
    pub links: Vec<LinkConfig>,

    #[serde(default)]
    pub sensors: Vec<SensorConfig>,

    #[serde(default)]
    pub contacts: Vec<ScriptedContact>,

    #[serde(default)]
    pub wrenches: Vec<ScriptedWrench>,

    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
}

impl ScenarioConfig {
    /// Extracts a scenario from any figment, layering the environment on top.
    pub fn from_figment(figment: Figment) -> Result<Self, SimError> {
        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX).split("__").only(&ENV_OVERRIDES))
            .extract()?)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, SimError> {
        Self::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    /// One past the highest link id; the scene's link count.
    pub fn num_links(&self) -> usize {
        self.links.iter().map(|l| l.id + 1).max().unwrap_or(0)
    }
}

/// Loads and parses a single scenario file.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, SimError> {
    if !path.is_file() {
        return Err(SimError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "scenario file not found"),
        });
    }
    ScenarioConfig::from_figment(Figment::new().merge(Toml::file_exact(path)))
}

/// Resolves `--scenario` into the list of files to run: the file itself, or
/// every `.toml` file below a directory in sorted order.
pub fn discover_scenarios(path: &Path) -> Result<Vec<PathBuf>, SimError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(SimError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        });
    }

    let mut found: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            !e.file_type().is_dir() && e.path().extension().map_or(false, |ext| ext == "toml")
        })
        .map(|e| e.into_path())
        .collect();
    found.sort();

    if found.is_empty() {
        return Err(SimError::NoScenarios(path.to_path_buf()));
    }
    debug!("Found {} scenario files under {:?}", found.len(), path);
    Ok(found)
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum SimulationMode {
    /// Sensors read contacts and joint wrenches from the scripted physics.
    #[default]
    Dynamic,
    /// Sensors only see geometry; forces read zero.
    Kinematic,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Simulation {
    /// Optional seed for the noise generator. Unseeded runs draw from entropy.
    pub seed: Option<u64>,
    /// Number of steps to run.
    #[serde(default = "default_steps")]
    pub steps: u32,
    /// Simulated time per step in seconds.
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default)]
    pub mode: SimulationMode,
}

fn default_steps() -> u32 {
    1
}

fn default_dt() -> f64 {
    0.01
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            seed: None,
            steps: default_steps(),
            dt: default_dt(),
            mode: SimulationMode::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    pub id: usize,
    #[serde(default)]
    pub pose: Pose,
}

#[derive(Deserialize, Debug, Clone, Copy, Default)]
#[serde(deny_unknown_fields)]
pub struct Pose {
    #[serde(with = "serde_helpers::vec3_from_array", default)]
    pub translation: Vector3<f64>,

    #[serde(with = "serde_helpers::quat_from_euler_deg", default)]
    pub rotation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }
}

/// A TOML value accepted in a sensor's `settings` table. Everything is
/// rendered to the textual format the sensor setters parse, so
/// `link = 2`, `hasForce = [0, 0, 1]` and `hasForce = "0 0 1"` all work.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum SettingValue {
    Integer(i64),
    Number(f64),
    Flag(bool),
    Text(String),
    Numbers(Vec<f64>),
    Flags(Vec<bool>),
}

impl SettingValue {
    pub fn to_setting_string(&self) -> String {
        fn flag(b: bool) -> &'static str {
            if b {
                "1"
            } else {
                "0"
            }
        }
        match self {
            SettingValue::Integer(i) => i.to_string(),
            SettingValue::Number(x) => x.to_string(),
            SettingValue::Flag(b) => flag(*b).to_string(),
            SettingValue::Text(s) => s.clone(),
            SettingValue::Numbers(v) => v
                .iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(" "),
            SettingValue::Flags(v) => v.iter().map(|b| flag(*b)).collect::<Vec<_>>().join(" "),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind")] // The "kind" field decides which variant to parse
#[serde(rename_all = "PascalCase")]
pub enum SensorConfig {
    ContactPatch {
        name: String,
        #[serde(default)]
        settings: BTreeMap<String, SettingValue>,
    },
    ForceTorque {
        name: String,
        #[serde(default)]
        settings: BTreeMap<String, SettingValue>,
    },
}

impl SensorConfig {
    pub fn get_name(&self) -> &str {
        match self {
            SensorConfig::ContactPatch { name, .. } => name,
            SensorConfig::ForceTorque { name, .. } => name,
        }
    }

    /// The sensor type name understood by the core factory.
    pub fn get_type_str(&self) -> &'static str {
        match self {
            SensorConfig::ContactPatch { .. } => ContactPatchSensor::TYPE_NAME,
            SensorConfig::ForceTorque { .. } => ForceTorqueSensor::TYPE_NAME,
        }
    }

    /// Settings rendered to strings, in key order.
    pub fn settings(&self) -> Vec<(String, String)> {
        let settings = match self {
            SensorConfig::ContactPatch { settings, .. } => settings,
            SensorConfig::ForceTorque { settings, .. } => settings,
        };
        settings
            .iter()
            .map(|(k, v)| (k.clone(), v.to_setting_string()))
            .collect()
    }
}

fn default_normal() -> Vector3<f64> {
    Vector3::z()
}

/// A contact point fed to the physics scene on every step of its window.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScriptedContact {
    pub link: usize,
    #[serde(with = "serde_helpers::point3_from_array")]
    pub position: Point3<f64>,
    #[serde(with = "serde_helpers::vec3_from_array", default = "default_normal")]
    pub normal: Vector3<f64>,
    #[serde(with = "serde_helpers::vec3_from_array")]
    pub force: Vector3<f64>,
    #[serde(default)]
    pub from_step: u32,
    /// Last step (inclusive) the contact is present. Open-ended when absent.
    pub until_step: Option<u32>,
}

impl ScriptedContact {
    pub fn is_active(&self, step: u32) -> bool {
        in_window(step, self.from_step, self.until_step)
    }
}

/// A joint wrench reported by the physics scene during its window.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScriptedWrench {
    pub link: usize,
    #[serde(with = "serde_helpers::vec3_from_array", default)]
    pub force: Vector3<f64>,
    #[serde(with = "serde_helpers::vec3_from_array", default)]
    pub torque: Vector3<f64>,
    #[serde(default)]
    pub from_step: u32,
    pub until_step: Option<u32>,
}

impl ScriptedWrench {
    pub fn is_active(&self, step: u32) -> bool {
        in_window(step, self.from_step, self.until_step)
    }
}

fn in_window(step: u32, from: u32, until: Option<u32>) -> bool {
    step >= from && until.map_or(true, |u| step <= u)
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "shape")]
#[serde(rename_all = "PascalCase")]
pub enum ObstacleConfig {
    Sphere {
        #[serde(with = "serde_helpers::point3_from_array")]
        center: Point3<f64>,
        radius: f64,
    },
    HalfSpace {
        #[serde(with = "serde_helpers::point3_from_array")]
        point: Point3<f64>,
        #[serde(with = "serde_helpers::vec3_from_array", default = "default_normal")]
        normal: Vector3<f64>,
    },
}

impl ObstacleConfig {
    pub fn to_obstacle(&self) -> Obstacle {
        match self {
            ObstacleConfig::Sphere { center, radius } => Obstacle::Sphere {
                center: *center,
                radius: *radius,
            },
            ObstacleConfig::HalfSpace { point, normal } => Obstacle::HalfSpace {
                point: *point,
                normal: *normal,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SCENARIO: &str = r#"
        [simulation]
        seed = 11
        steps = 5
        mode = "Kinematic"

        [[links]]
        id = 0

        [[links]]
        id = 2
        pose = { translation = [0.0, 0.0, 1.0], rotation = [0.0, 0.0, 90.0] }

        [[sensors]]
        kind = "ContactPatch"
        name = "fingertip"
        settings = { link = 2, patchMin = [-0.01, -0.01], patchMax = "0.01 0.01", hasForce = [false, false, true] }

        [[sensors]]
        kind = "ForceTorque"
        name = "wrist"

        [[contacts]]
        link = 2
        position = [0.0, 0.0, 1.0]
        force = [0.0, 0.0, 3.5]
        from_step = 1
        until_step = 3

        [[obstacles]]
        shape = "Sphere"
        center = [0.0, 0.0, 1.0]
        radius = 0.05

        [[obstacles]]
        shape = "HalfSpace"
        point = [0.0, 0.0, 0.0]
    "#;

    #[test]
    fn test_full_scenario_parses() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).unwrap();
        assert_eq!(config.simulation.seed, Some(11));
        assert_eq!(config.simulation.steps, 5);
        assert_eq!(config.simulation.mode, SimulationMode::Kinematic);
        assert_eq!(config.num_links(), 3);

        let link = config.links[1].pose.to_isometry();
        assert_abs_diff_eq!(link.translation.vector, Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(link * Vector3::x(), Vector3::y(), epsilon = 1e-12);

        assert_eq!(config.sensors.len(), 2);
        assert_eq!(config.sensors[0].get_type_str(), "ContactSensor");
        assert_eq!(config.sensors[1].get_name(), "wrist");
        assert!(config.sensors[1].settings().is_empty());

        assert_eq!(config.contacts[0].normal, Vector3::z());
        assert_eq!(config.obstacles.len(), 2);
    }

    #[test]
    fn test_setting_values_render_to_text() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).unwrap();
        let settings: BTreeMap<String, String> = config.sensors[0].settings().into_iter().collect();
        assert_eq!(settings["link"], "2");
        assert_eq!(settings["patchMin"], "-0.01 -0.01");
        assert_eq!(settings["patchMax"], "0.01 0.01");
        assert_eq!(settings["hasForce"], "0 0 1");
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = ScenarioConfig::from_toml_str("").unwrap();
        assert_eq!(config.simulation.steps, 1);
        assert_eq!(config.simulation.mode, SimulationMode::Dynamic);
        assert!(config.simulation.seed.is_none());
        assert_eq!(config.num_links(), 0);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = ScenarioConfig::from_toml_str("[simulation]\nduration = 3.0\n");
        assert!(matches!(err, Err(SimError::Config(_))));

        let err = ScenarioConfig::from_toml_str("[[sensors]]\nkind = \"Sonar\"\nname = \"s\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_unrelated_env_vars_are_ignored() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("HAPTIC_LOG", "/tmp/out.toml");
            jail.set_env("HAPTIC_SENSORS__0__NAME", "ghost");
            let config = ScenarioConfig::from_toml_str("[[links]]\nid = 0\n").unwrap();
            assert_eq!(config.num_links(), 1);
            assert!(config.sensors.is_empty());
            Ok(())
        });
    }

    #[test]
    fn test_step_windows() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).unwrap();
        let contact = &config.contacts[0];
        assert!(!contact.is_active(0));
        assert!(contact.is_active(1));
        assert!(contact.is_active(3));
        assert!(!contact.is_active(4));
        assert!(in_window(1_000, 0, None));
    }

    #[test]
    fn test_discover_single_file_and_missing_path() {
        let dir = std::env::temp_dir().join(format!("haptic_discover_{}", std::process::id()));
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("b.toml"), "").unwrap();
        std::fs::write(dir.join("nested").join("a.toml"), "").unwrap();
        std::fs::write(dir.join("notes.txt"), "").unwrap();

        let found = discover_scenarios(&dir).unwrap();
        assert_eq!(found, vec![dir.join("b.toml"), dir.join("nested").join("a.toml")]);

        let single = discover_scenarios(&dir.join("b.toml")).unwrap();
        assert_eq!(single.len(), 1);

        assert!(matches!(
            discover_scenarios(&dir.join("missing")),
            Err(SimError::Io { .. })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
