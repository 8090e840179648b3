// haptic_sim/src/simulation/runner.rs

use tracing::{debug, info, warn};

use crate::prelude::*;

/// Command-line overrides applied on top of a scenario.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub seed: Option<u64>,
    pub steps: Option<u32>,
    /// Forces kinematic mode regardless of the scenario.
    pub kinematic: bool,
    /// Inject these measurements instead of simulating.
    pub replay: Option<MeasurementLog>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: u32,
    /// Sensor steps that failed and kept their previous measurement.
    pub failures: usize,
    pub log: MeasurementLog,
}

/// Creates every configured sensor through the core factory and checks it
/// against the scenario's links.
pub fn build_suite(config: &ScenarioConfig) -> Result<SensorSuite, SimError> {
    let mut suite = SensorSuite::new();
    for sensor in &config.sensors {
        let settings = sensor.settings();
        suite
            .add_from_settings(
                sensor.get_name(),
                sensor.get_type_str(),
                settings.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            )
            .map_err(|source| SimError::Sensor {
                sensor: sensor.get_name().to_string(),
                source,
            })?;
        debug!(
            "Created {} sensor '{}'",
            sensor.get_type_str(),
            sensor.get_name()
        );
    }

    if let Some((sensor, source)) = suite.validate(config.num_links()).into_iter().next() {
        return Err(SimError::Sensor { sensor, source });
    }
    Ok(suite)
}

/// Steps the scenario and collects every reported measurement.
pub fn run_scenario(config: &ScenarioConfig, options: &RunOptions) -> Result<RunSummary, SimError> {
    let mut suite = build_suite(config)?;
    let mut world = ScriptedWorld::from_config(config)?;

    let mode = if options.kinematic {
        SimulationMode::Kinematic
    } else {
        config.simulation.mode
    };
    let steps = match (options.steps, options.replay.as_ref().and_then(|l| l.last_step())) {
        (Some(steps), _) => steps,
        // Replay runs through the last recorded step.
        (None, Some(last)) => last
            .checked_add(1)
            .ok_or(SimError::ReplayStepOutOfRange(last))?,
        (None, None) => config.simulation.steps,
    };

    let mut rng = match options.seed.or(config.simulation.seed) {
        Some(seed) => {
            info!("Seeding sensor noise with {}", seed);
            SensorRng::seeded(seed)
        }
        None => {
            warn!("No seed configured; sensor noise will not be reproducible");
            SensorRng::from_entropy()
        }
    };

    info!(
        "Running sensors [{}] for {} steps ({:?} mode{})",
        suite.names().collect::<Vec<_>>().join(", "),
        steps,
        mode,
        if options.replay.is_some() { ", replay" } else { "" }
    );

    let mut log = MeasurementLog::default();
    let mut failures = 0;
    for step in 0..steps {
        let scene = world.step(step);

        if let Some(replay) = &options.replay {
            for record in replay.at_step(step) {
                suite
                    .set_measurements(&record.sensor, &record.values)
                    .map_err(|source| SimError::Sensor {
                        sensor: record.sensor.clone(),
                        source,
                    })?;
            }
        } else {
            let failed = match mode {
                SimulationMode::Dynamic => suite.simulate(scene, &mut rng),
                SimulationMode::Kinematic => suite.simulate_kinematic(scene),
            };
            failures += failed.len();
        }

        let time = f64::from(step) * config.simulation.dt;
        for reading in suite.readings() {
            info!("[step {:>4}] {}", step, describe(&suite, &reading));
        }
        log.record(step, time, suite.readings());
    }

    Ok(RunSummary {
        steps,
        failures,
        log,
    })
}

/// `"name: meas=value ..."` for one reading.
fn describe(suite: &SensorSuite, reading: &SensorReading) -> String {
    let names = suite
        .get(&reading.sensor)
        .map(|s| s.measurement_names())
        .unwrap_or_default();
    let fields = names
        .iter()
        .zip(&reading.values)
        .map(|(n, v)| format!("{n}={v:.4}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}: {}", reading.sensor, fields)
}
