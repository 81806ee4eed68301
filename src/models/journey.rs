//! Journey phase transitions
//!
//! Given the phase a vehicle was in, lists the phases it may be in after the
//! next observation.

use crate::types::observation::Observation;
use crate::types::phase::JourneyPhase;

/// Trait for discrete phase transition models.
///
/// Implementations must be deterministic and return a non-empty list in a
/// fixed order, so that sampling is reproducible under a fixed seed.
pub trait PhaseTransitionModel {
    /// Returns the candidate phases reachable from `parent` given `obs`.
    fn candidate_phases(&self, parent: &JourneyPhase, obs: &Observation) -> Vec<JourneyPhase>;
}

/// The duty-cycle state machine for block-operated transit vehicles.
///
/// A deadhead that continues keeps its original start location; a deadhead
/// entered fresh starts at the current observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DutyCycleModel;

impl DutyCycleModel {
    /// Creates the state machine.
    pub fn new() -> Self {
        Self
    }
}

impl PhaseTransitionModel for DutyCycleModel {
    fn candidate_phases(&self, parent: &JourneyPhase, obs: &Observation) -> Vec<JourneyPhase> {
        use JourneyPhase as P;

        let here = obs.location;
        match *parent {
            P::AtBase | P::LayoverBefore => vec![
                P::AtBase,
                P::LayoverBefore,
                P::deadhead_before(here),
                P::InProgress,
            ],
            P::DeadheadBefore { start } => vec![
                P::AtBase,
                P::LayoverBefore,
                P::deadhead_before(start),
                P::InProgress,
            ],
            P::InProgress => vec![
                P::InProgress,
                P::deadhead_during(here),
                P::LayoverDuring,
                P::DeadheadAfter,
                P::LayoverAfter,
            ],
            P::DeadheadDuring { start } => vec![
                P::InProgress,
                P::deadhead_during(start),
                P::LayoverDuring,
            ],
            P::LayoverDuring => vec![
                P::InProgress,
                P::deadhead_during(here),
                P::LayoverDuring,
            ],
            P::DeadheadAfter | P::LayoverAfter => vec![
                P::AtBase,
                P::deadhead_before(here),
                P::InProgress,
                P::DeadheadAfter,
                P::LayoverAfter,
            ],
        }
    }
}
