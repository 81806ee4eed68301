//! Journey phases
//!
//! A vehicle's duty cycle is modelled as a closed set of phases. Deadhead
//! phases remember where the current deadhead began, so the data lives in the
//! variant and a deadhead without a start location cannot be constructed.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::location::Location;
use crate::TrackphaseError;

// ============================================================================
// Phase Discriminant
// ============================================================================

/// The data-free discriminant of a [`JourneyPhase`].
///
/// Used for labels, logging and serialized summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseKind {
    /// Parked at a depot
    AtBase,
    /// Driving out of service towards the first trip of a block
    DeadheadBefore,
    /// Waiting at a terminal before the first trip
    LayoverBefore,
    /// Operating a scheduled trip
    InProgress,
    /// Driving out of service between trips of a block
    DeadheadDuring,
    /// Waiting at a terminal between trips
    LayoverDuring,
    /// Driving out of service after the last trip
    DeadheadAfter,
    /// Waiting after the last trip
    LayoverAfter,
}

impl PhaseKind {
    /// Every phase, in declaration order.
    pub const ALL: [PhaseKind; 8] = [
        PhaseKind::AtBase,
        PhaseKind::DeadheadBefore,
        PhaseKind::LayoverBefore,
        PhaseKind::InProgress,
        PhaseKind::DeadheadDuring,
        PhaseKind::LayoverDuring,
        PhaseKind::DeadheadAfter,
        PhaseKind::LayoverAfter,
    ];

    /// The canonical upper-case label, e.g. `DEADHEAD_BEFORE`.
    pub const fn label(self) -> &'static str {
        match self {
            PhaseKind::AtBase => "AT_BASE",
            PhaseKind::DeadheadBefore => "DEADHEAD_BEFORE",
            PhaseKind::LayoverBefore => "LAYOVER_BEFORE",
            PhaseKind::InProgress => "IN_PROGRESS",
            PhaseKind::DeadheadDuring => "DEADHEAD_DURING",
            PhaseKind::LayoverDuring => "LAYOVER_DURING",
            PhaseKind::DeadheadAfter => "DEADHEAD_AFTER",
            PhaseKind::LayoverAfter => "LAYOVER_AFTER",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PhaseKind {
    type Err = TrackphaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhaseKind::ALL
            .into_iter()
            .find(|kind| kind.label() == s)
            .ok_or_else(|| TrackphaseError::UnknownPhase {
                value: s.to_string(),
            })
    }
}

// ============================================================================
// Journey Phase
// ============================================================================

/// A journey phase together with the data the phase requires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JourneyPhase {
    /// Parked at a depot
    AtBase,
    /// Deadheading towards the block; carries where the deadhead began
    DeadheadBefore {
        /// Location at which this deadhead started
        start: Location,
    },
    /// Laying over before the block starts
    LayoverBefore,
    /// Operating a trip
    InProgress,
    /// Deadheading between trips; carries where the deadhead began
    DeadheadDuring {
        /// Location at which this deadhead started
        start: Location,
    },
    /// Laying over between trips
    LayoverDuring,
    /// Deadheading after the block
    DeadheadAfter,
    /// Laying over after the block
    LayoverAfter,
}

impl JourneyPhase {
    /// Deadhead-before phase starting at `start`.
    #[inline]
    pub fn deadhead_before(start: Location) -> Self {
        JourneyPhase::DeadheadBefore { start }
    }

    /// Deadhead-during phase starting at `start`.
    #[inline]
    pub fn deadhead_during(start: Location) -> Self {
        JourneyPhase::DeadheadDuring { start }
    }

    /// Returns the data-free discriminant.
    pub fn kind(&self) -> PhaseKind {
        match self {
            JourneyPhase::AtBase => PhaseKind::AtBase,
            JourneyPhase::DeadheadBefore { .. } => PhaseKind::DeadheadBefore,
            JourneyPhase::LayoverBefore => PhaseKind::LayoverBefore,
            JourneyPhase::InProgress => PhaseKind::InProgress,
            JourneyPhase::DeadheadDuring { .. } => PhaseKind::DeadheadDuring,
            JourneyPhase::LayoverDuring => PhaseKind::LayoverDuring,
            JourneyPhase::DeadheadAfter => PhaseKind::DeadheadAfter,
            JourneyPhase::LayoverAfter => PhaseKind::LayoverAfter,
        }
    }

    /// Where the current deadhead began, for the phases that track it.
    pub fn journey_start(&self) -> Option<Location> {
        match self {
            JourneyPhase::DeadheadBefore { start } | JourneyPhase::DeadheadDuring { start } => {
                Some(*start)
            }
            _ => None,
        }
    }

    /// True while the vehicle is working through its block.
    pub fn is_active_during_block(&self) -> bool {
        matches!(
            self,
            JourneyPhase::InProgress
                | JourneyPhase::DeadheadDuring { .. }
                | JourneyPhase::LayoverDuring
        )
    }

    /// True for any of the layover phases.
    pub fn is_layover(&self) -> bool {
        matches!(
            self,
            JourneyPhase::LayoverBefore | JourneyPhase::LayoverDuring | JourneyPhase::LayoverAfter
        )
    }

    /// Builds a data-free phase from its discriminant.
    ///
    /// Fails with [`TrackphaseError::InvariantViolation`] for deadhead kinds
    /// that require a start location.
    pub fn from_kind(kind: PhaseKind) -> crate::Result<Self> {
        match kind {
            PhaseKind::AtBase => Ok(JourneyPhase::AtBase),
            PhaseKind::LayoverBefore => Ok(JourneyPhase::LayoverBefore),
            PhaseKind::InProgress => Ok(JourneyPhase::InProgress),
            PhaseKind::LayoverDuring => Ok(JourneyPhase::LayoverDuring),
            PhaseKind::DeadheadAfter => Ok(JourneyPhase::DeadheadAfter),
            PhaseKind::LayoverAfter => Ok(JourneyPhase::LayoverAfter),
            PhaseKind::DeadheadBefore | PhaseKind::DeadheadDuring => {
                Err(TrackphaseError::InvariantViolation {
                    details: format!("{kind} requires a journey start location"),
                })
            }
        }
    }
}

impl fmt::Display for JourneyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.journey_start() {
            Some(start) => write!(f, "{} from {}", self.kind(), start),
            None => write!(f, "{}", self.kind()),
        }
    }
}
