//! Block assignment (schedule) collaborator
//!
//! The schedule service is external; the inference core only sees this seam.

use crate::types::block::BlockStateObservation;
use crate::types::observation::Observation;
use crate::types::phase::JourneyPhase;
use crate::types::vehicle::{MotionState, VehicleState};
use crate::UpstreamError;

/// Trait for services that propose a schedule assignment for a candidate.
///
/// Returning `Ok(None)` means "no plausible assignment for this candidate"
/// and is a valid outcome. `Err` means the service itself failed.
///
/// Implementations are shared across vehicles and must tolerate concurrent
/// calls.
pub trait BlockAssignment: Send + Sync {
    /// Proposes an assignment for a vehicle moving from `parent` into `phase`.
    fn transition_block_state(
        &self,
        parent: &VehicleState,
        motion: &MotionState,
        phase: &JourneyPhase,
        obs: &Observation,
    ) -> Result<Option<BlockStateObservation>, UpstreamError>;
}

impl<F> BlockAssignment for F
where
    F: Fn(
            &VehicleState,
            &MotionState,
            &JourneyPhase,
            &Observation,
        ) -> Result<Option<BlockStateObservation>, UpstreamError>
        + Send
        + Sync,
{
    fn transition_block_state(
        &self,
        parent: &VehicleState,
        motion: &MotionState,
        phase: &JourneyPhase,
        obs: &Observation,
    ) -> Result<Option<BlockStateObservation>, UpstreamError> {
        self(parent, motion, phase, obs)
    }
}

/// Assignment service for vehicles without schedule data: never assigns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unassigned;

impl BlockAssignment for Unassigned {
    fn transition_block_state(
        &self,
        _parent: &VehicleState,
        _motion: &MotionState,
        _phase: &JourneyPhase,
        _obs: &Observation,
    ) -> Result<Option<BlockStateObservation>, UpstreamError> {
        Ok(None)
    }
}

/// Assignment service that keeps the parent's assignment unchanged.
///
/// Useful when the block is known from the operator's sign-in and only the
/// phase is in doubt.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepParentAssignment;

impl BlockAssignment for KeepParentAssignment {
    fn transition_block_state(
        &self,
        parent: &VehicleState,
        _motion: &MotionState,
        _phase: &JourneyPhase,
        _obs: &Observation,
    ) -> Result<Option<BlockStateObservation>, UpstreamError> {
        Ok(parent.block.clone())
    }
}
