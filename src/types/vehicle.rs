//! Vehicle states (particles)
//!
//! One [`VehicleState`] is one hypothesis about a vehicle after an
//! observation. States are never mutated: each step builds fresh candidates
//! and the survivor becomes the parent of the next step.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::block::BlockStateObservation;
use super::location::Location;
use super::observation::Observation;
use super::phase::{JourneyPhase, PhaseKind};

/// Position along the road/route network, as matched by the path-snapping layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeState {
    /// Matched network edge, if snapping succeeded
    pub edge_id: Option<String>,
    /// Distance along the edge in meters
    pub distance_along: f64,
}

/// Motion hypothesis supplied by the motion model.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    /// Last time the vehicle was judged to be moving
    pub last_in_motion_time: DateTime<Utc>,
    /// Where the vehicle was when last judged to be moving
    pub last_in_motion_location: Location,
}

impl MotionState {
    /// Motion state anchored at an observation.
    pub fn from_observation(obs: &Observation) -> Self {
        Self {
            last_in_motion_time: obs.timestamp,
            last_in_motion_location: obs.location,
        }
    }
}

/// A complete vehicle hypothesis.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    /// Network position
    pub edge: EdgeState,
    /// Motion hypothesis
    pub motion: MotionState,
    /// Schedule assignment, absent when no plausible block exists
    pub block: Option<BlockStateObservation>,
    /// Journey phase
    pub journey: JourneyPhase,
    /// The observation this state explains
    pub observation: Arc<Observation>,
}

impl VehicleState {
    /// Assembles a vehicle state.
    pub fn new(
        edge: EdgeState,
        motion: MotionState,
        block: Option<BlockStateObservation>,
        journey: JourneyPhase,
        observation: Arc<Observation>,
    ) -> Self {
        Self {
            edge,
            motion,
            block,
            journey,
            observation,
        }
    }

    /// An unassigned vehicle parked at base, the usual starting particle.
    pub fn initial(observation: Arc<Observation>) -> Self {
        let motion = MotionState::from_observation(&observation);
        Self::new(
            EdgeState::default(),
            motion,
            None,
            JourneyPhase::AtBase,
            observation,
        )
    }

    /// Schedule deviation in minutes under the current assignment.
    pub fn schedule_deviation(&self) -> Option<f64> {
        self.block.as_ref().map(|b| b.schedule_deviation)
    }

    /// Read-only summary for presentation layers.
    pub fn summary(&self) -> InferredVehicleState {
        let block = self.block.as_ref().map(|b| &b.block_state);
        InferredVehicleState {
            vehicle_id: self.observation.vehicle_id.clone(),
            timestamp: self.observation.timestamp,
            phase: self.journey.kind(),
            block_id: block.map(|b| b.block_id.clone()),
            trip_id: block.map(|b| b.trip_id.clone()),
            service_date: block.map(|b| b.service_date),
            schedule_deviation: self.schedule_deviation(),
            lat: self.observation.location.lat(),
            lon: self.observation.location.lon(),
        }
    }
}

/// Serializable snapshot of a selected vehicle state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferredVehicleState {
    /// Vehicle identifier
    pub vehicle_id: String,
    /// Observation time
    pub timestamp: DateTime<Utc>,
    /// Inferred journey phase
    pub phase: PhaseKind,
    /// Assigned block, if any
    pub block_id: Option<String>,
    /// Assigned trip, if any
    pub trip_id: Option<String>,
    /// Service date of the assigned block
    pub service_date: Option<NaiveDate>,
    /// Schedule deviation in minutes (positive = late)
    pub schedule_deviation: Option<f64>,
    /// Reported latitude
    pub lat: f64,
    /// Reported longitude
    pub lon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::block::BlockState;
    use chrono::TimeZone;

    #[test]
    fn test_summary_carries_assignment() {
        let obs = Arc::new(Observation::new(
            "bus-42",
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            Location::new(40.7, -74.0),
        ));
        let block = BlockStateObservation::new(
            BlockState::new("B9", "T3", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
            1.5,
        );
        let state = VehicleState::new(
            EdgeState::default(),
            MotionState::from_observation(&obs),
            Some(block),
            JourneyPhase::InProgress,
            obs,
        );

        let summary = state.summary();
        assert_eq!(summary.phase, PhaseKind::InProgress);
        assert_eq!(summary.trip_id.as_deref(), Some("T3"));
        assert_eq!(summary.schedule_deviation, Some(1.5));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["phase"], "IN_PROGRESS");
        assert_eq!(json["block_id"], "B9");
    }

    #[test]
    fn test_initial_state_is_unassigned_at_base() {
        let obs = Arc::new(Observation::new(
            "bus-1",
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            Location::new(40.7, -74.0),
        ));
        let state = VehicleState::initial(obs);
        assert_eq!(state.journey, JourneyPhase::AtBase);
        assert!(state.block.is_none());
        assert!(state.summary().block_id.is_none());
    }
}
