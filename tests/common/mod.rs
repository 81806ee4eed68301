//! Common test helpers for journey filter integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use trackphase::prelude::*;
use trackphase::UpstreamError;

/// Depot location used across scenarios
pub fn depot() -> Location {
    Location::new(40.7128, -74.0060)
}

/// Fixed reference time for reproducible observations
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 6, 0, 0).unwrap()
}

/// Service date matching [`t0`]
pub fn service_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

/// Creates an observation `minutes` after [`t0`] at `location`
pub fn make_observation(minutes: i64, location: Location) -> Arc<Observation> {
    Arc::new(Observation::new(
        "bus-100",
        t0() + TimeDelta::minutes(minutes),
        location,
    ))
}

/// Creates an observation linked to its predecessor
pub fn make_linked_observation(previous: &Observation, minutes: i64, location: Location) -> Arc<Observation> {
    Arc::new(
        Observation::new("bus-100", t0() + TimeDelta::minutes(minutes), location).with_previous(previous),
    )
}

/// Creates an assignment on block `B-1` with the given deviation
pub fn make_assignment(deviation: f64) -> BlockStateObservation {
    BlockStateObservation::new(
        BlockState::new("B-1", "B-1-T1", service_date()).with_run("R-1"),
        deviation,
    )
}

/// Creates a parent state in `phase` with an optional assignment
pub fn make_parent(phase: JourneyPhase, obs: &Arc<Observation>, block: Option<BlockStateObservation>) -> VehicleState {
    VehicleState::new(
        EdgeState::default(),
        MotionState::from_observation(obs),
        block,
        phase,
        Arc::clone(obs),
    )
}

/// Default sensor model (schedule rule only)
pub fn default_sensor() -> SensorModel {
    SensorModel::from_config(&InferenceConfig::default()).unwrap()
}

/// Assignment service returning the same deviation for every phase
pub fn constant_deviation(
    deviation: f64,
) -> impl Fn(&VehicleState, &MotionState, &JourneyPhase, &Observation) -> std::result::Result<Option<BlockStateObservation>, UpstreamError>
       + Send
       + Sync {
    move |_: &VehicleState, _: &MotionState, _: &JourneyPhase, _: &Observation| Ok(Some(make_assignment(deviation)))
}
