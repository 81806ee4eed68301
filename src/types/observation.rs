//! Position reports
//!
//! An [`Observation`] is produced by the ingestion layer and is read-only to
//! the inference core.

use chrono::{DateTime, TimeDelta, Utc};

use super::location::Location;

/// A single position report for one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Identifier of the reporting vehicle
    pub vehicle_id: String,
    /// Time of the report
    pub timestamp: DateTime<Utc>,
    /// Reported (preprocessed) position
    pub location: Location,
    /// Whether the ingestion layer placed the report inside a depot
    pub at_base: bool,
    previous: Option<Box<Observation>>,
}

impl Observation {
    /// Creates an observation with no link to a previous report.
    pub fn new(vehicle_id: impl Into<String>, timestamp: DateTime<Utc>, location: Location) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            timestamp,
            location,
            at_base: false,
            previous: None,
        }
    }

    /// Marks the report as taken inside a depot.
    pub fn with_at_base(mut self, at_base: bool) -> Self {
        self.at_base = at_base;
        self
    }

    /// Links the immediately preceding report for the same vehicle.
    ///
    /// Only one step of history is kept: the stored copy has its own link
    /// dropped.
    pub fn with_previous(mut self, previous: &Observation) -> Self {
        let mut prev = previous.clone();
        prev.previous = None;
        self.previous = Some(Box::new(prev));
        self
    }

    /// The immediately preceding report, if known.
    pub fn previous(&self) -> Option<&Observation> {
        self.previous.as_deref()
    }

    /// Time elapsed since the previous report.
    pub fn elapsed_since_previous(&self) -> Option<TimeDelta> {
        self.previous().map(|prev| self.timestamp - prev.timestamp)
    }

    /// Distance travelled since the previous report, in meters.
    pub fn distance_from_previous(&self) -> Option<f64> {
        self.previous()
            .map(|prev| prev.location.distance_to(&self.location))
    }
}
