//! Schedule assignments
//!
//! Candidate block assignments are produced by an external block-assignment
//! service and consumed read-only by the sensor rules.

use chrono::NaiveDate;

/// A candidate schedule assignment: which block and trip the vehicle runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockState {
    /// Block (sequence of trips) identifier
    pub block_id: String,
    /// Trip within the block the vehicle is matched to
    pub trip_id: String,
    /// Service date the block instance belongs to
    pub service_date: NaiveDate,
    /// Operator run, when the source reports one
    pub run_id: Option<String>,
}

impl BlockState {
    /// Creates a block state without a run identifier.
    pub fn new(block_id: impl Into<String>, trip_id: impl Into<String>, service_date: NaiveDate) -> Self {
        Self {
            block_id: block_id.into(),
            trip_id: trip_id.into(),
            service_date,
            run_id: None,
        }
    }

    /// Attaches an operator run identifier.
    pub fn with_run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// True when both assignments refer to the same block instance and run.
    pub fn same_run(&self, other: &BlockState) -> bool {
        self.block_id == other.block_id
            && self.service_date == other.service_date
            && self.run_id == other.run_id
    }
}

/// A block assignment evaluated against one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStateObservation {
    /// The assignment
    pub block_state: BlockState,
    /// Signed schedule deviation in minutes (positive = late)
    pub schedule_deviation: f64,
}

impl BlockStateObservation {
    /// Pairs an assignment with its schedule deviation in minutes.
    pub fn new(block_state: BlockState, schedule_deviation: f64) -> Self {
        Self {
            block_state,
            schedule_deviation,
        }
    }

    /// The deviation, if it is a usable finite number.
    pub fn finite_deviation(&self) -> Option<f64> {
        self.schedule_deviation
            .is_finite()
            .then_some(self.schedule_deviation)
    }
}
