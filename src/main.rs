//! Example usage of the Trackphase library
//!
//! Replays a simulated bus pulling out of its depot, deadheading to the start
//! of its block and running the first trip slightly behind schedule. Each
//! inferred state is printed as one JSON line.
//!
//! Usage: `trackphase [config.toml]`

use std::error::Error;
use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::{info, warn};
use trackphase::prelude::*;
use trackphase::UpstreamError;

/// Scheduled speed along the route, meters per minute.
const SCHEDULED_SPEED: f64 = 300.0;
/// Minutes after the first report at which the trip is scheduled to start.
const TRIP_START_MINUTE: i64 = 10;

/// Favors `AT_BASE` exactly when the ingestion layer placed the report in a depot.
struct DepotRule;

impl SensorRule for DepotRule {
    fn name(&self) -> &'static str {
        "pAtBase"
    }

    fn likelihood(&self, context: &SensorContext<'_>) -> Result<Likelihood> {
        let at_base = matches!(context.state.journey, JourneyPhase::AtBase);
        let p = match (context.observation.at_base, at_base) {
            (true, true) | (false, false) => 0.9,
            (true, false) | (false, true) => 0.1,
        };
        let mut result = Likelihood::new(self.name());
        result.add_factor_and("depot agreement", p);
        Ok(result)
    }
}

fn main() -> std::result::Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trackphase=info".into()),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => InferenceConfig::load(path)?,
        None => InferenceConfig::default(),
    };
    info!(?config, "configuration loaded");

    let depot = Location::new(40.7000, -74.0000);
    let route_start = depot.offset_meters(0.0, 1500.0);
    let t0 = Utc
        .with_ymd_and_hms(2024, 6, 3, 6, 0, 0)
        .single()
        .ok_or("invalid start time")?;
    let service_date = t0.date_naive();

    // Toy schedule service: one block whose first trip runs due east from
    // `route_start` at the scheduled speed.
    let schedule = move |_: &VehicleState, _: &MotionState, phase: &JourneyPhase, obs: &Observation| {
        let scheduled_start = t0 + TimeDelta::minutes(TRIP_START_MINUTE);
        let minutes_past_start = (obs.timestamp - scheduled_start).num_seconds() as f64 / 60.0;
        let deviation = match phase {
            JourneyPhase::AtBase => return Ok::<_, UpstreamError>(None),
            JourneyPhase::DeadheadBefore { .. } | JourneyPhase::LayoverBefore => minutes_past_start.max(0.0),
            JourneyPhase::DeadheadAfter | JourneyPhase::LayoverAfter => 0.0,
            _ => {
                let travelled = route_start.distance_to(&obs.location);
                minutes_past_start - travelled / SCHEDULED_SPEED
            }
        };
        let block = BlockState::new("B-42", "B-42-T1", service_date).with_run("R-7");
        Ok(Some(BlockStateObservation::new(block, deviation)))
    };

    let sensor = SensorModel::from_config(&config)?.with_rule(DepotRule);
    info!(rules = ?sensor.rule_names(), "sensor model ready");
    let filter = JourneyFilter::with_duty_cycle(schedule, sensor);

    let mut rng = StdRng::seed_from_u64(42);
    let gps_noise = Normal::new(0.0, 8.0)?;

    let mut previous: Option<Observation> = None;
    let mut state: Option<VehicleState> = None;

    for minute in 0..30 {
        let truth = simulated_position(depot, route_start, minute);
        let reported = truth.offset_meters(gps_noise.sample(&mut rng), gps_noise.sample(&mut rng));
        let mut obs = Observation::new("bus-1001", t0 + TimeDelta::minutes(minute), reported)
            .with_at_base(minute < 4);
        if let Some(prev) = &previous {
            obs = obs.with_previous(prev);
        }
        previous = Some(obs.clone());
        let obs = Arc::new(obs);

        let parent = state
            .take()
            .unwrap_or_else(|| VehicleState::initial(Arc::clone(&obs)));
        let motion = MotionState::from_observation(&obs);

        match filter.step_with_stats(&parent, EdgeState::default(), motion, obs, &mut rng) {
            Ok((selected, stats)) => {
                info!(minute, candidates = stats.candidates, assigned = stats.assigned, "step complete");
                println!("{}", serde_json::to_string(&selected.summary())?);
                state = Some(selected);
            }
            Err(err) if !err.is_fatal() => {
                warn!(minute, code = err.code(), %err, "keeping previous state");
                state = Some(parent);
            }
            Err(err) => return Err(err.into()),
        }
    }

    info!("replay complete");
    Ok(())
}

/// Ground-truth position of the simulated bus `minute` minutes into the replay.
fn simulated_position(depot: Location, route_start: Location, minute: i64) -> Location {
    match minute {
        m if m < 4 => depot,
        // Pull-out: 1.5 km north over six minutes
        m if m < TRIP_START_MINUTE => depot.offset_meters(0.0, 250.0 * (m - 3) as f64),
        // In service, running a little under schedule speed
        m => route_start.offset_meters(280.0 * (m - TRIP_START_MINUTE) as f64, 0.0),
    }
}
