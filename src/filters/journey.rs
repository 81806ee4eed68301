//! Journey transition filter
//!
//! One step of the journey particle filter: enumerate candidate phases for
//! the parent, ask the block-assignment service for an assignment per phase,
//! score each candidate with the sensor model, then draw one survivor.
//!
//! # Weights
//!
//! Candidates are weighted by `exp(l - max l)` where `l` is the candidate's
//! total log-likelihood. Ratios between candidates are unchanged, but a set
//! of very unlikely candidates no longer underflows to all-zero.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, debug_span, trace};

use crate::models::{BlockAssignment, DutyCycleModel, PhaseTransitionModel, SensorContext, SensorModel};
use crate::types::likelihood::Likelihood;
use crate::types::observation::Observation;
use crate::types::vehicle::{EdgeState, MotionState, VehicleState};
use crate::utils::CdfMap;
use crate::{Result, TrackphaseError};

// ============================================================================
// Step Statistics
// ============================================================================

/// Counters describing one transition step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Number of candidates scored
    pub candidates: usize,
    /// Candidates that could not be drawn (zero or underflowing weight)
    pub zero_weight: usize,
    /// Candidates for which the block-assignment service returned an assignment
    pub assigned: usize,
}

impl StepStats {
    /// Number of candidates that could have been drawn.
    pub fn selectable(&self) -> usize {
        self.candidates - self.zero_weight
    }
}

// ============================================================================
// Scored Candidates
// ============================================================================

/// A candidate state together with its sensor-model evaluation.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    /// The candidate
    pub state: VehicleState,
    /// Aggregate likelihood with per-rule provenance
    pub likelihood: Likelihood,
}

impl ScoredCandidate {
    /// Total log-likelihood of the candidate.
    pub fn log_likelihood(&self) -> f64 {
        self.likelihood.total_log_probability()
    }
}

/// Sampling weights relative to the best finite log-likelihood.
///
/// Returns all zeros when no candidate has a finite log-likelihood.
pub fn relative_weights(log_likelihoods: &[f64]) -> Vec<f64> {
    let max = log_likelihoods
        .iter()
        .copied()
        .filter(|l| l.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![0.0; log_likelihoods.len()];
    }
    log_likelihoods.iter().map(|l| (l - max).exp()).collect()
}

// ============================================================================
// Journey Filter
// ============================================================================

/// Single-step journey transition filter.
///
/// Holds the phase state machine, the block-assignment service and the
/// sensor model. The filter is immutable and may be shared across threads to
/// step many vehicles; the random source is supplied per call.
#[derive(Debug)]
pub struct JourneyFilter<B, P = DutyCycleModel> {
    /// Phase state machine
    pub phases: P,
    /// Block-assignment service
    pub blocks: B,
    /// Sensor rules
    pub sensor: SensorModel,
}

impl<B: BlockAssignment> JourneyFilter<B, DutyCycleModel> {
    /// Creates a filter using the standard duty-cycle state machine.
    pub fn with_duty_cycle(blocks: B, sensor: SensorModel) -> Self {
        Self::new(DutyCycleModel::new(), blocks, sensor)
    }
}

impl<B, P> JourneyFilter<B, P>
where
    B: BlockAssignment,
    P: PhaseTransitionModel,
{
    /// Creates a filter from its collaborators.
    pub fn new(phases: P, blocks: B, sensor: SensorModel) -> Self {
        Self {
            phases,
            blocks,
            sensor,
        }
    }

    /// Builds and scores every candidate for `obs`, in state-machine order.
    ///
    /// Fails if the state machine offers no phase, if the block-assignment
    /// service fails, or if a sensor rule cannot be evaluated.
    pub fn candidates(
        &self,
        parent: &VehicleState,
        edge: &EdgeState,
        motion: &MotionState,
        obs: &Arc<Observation>,
    ) -> Result<Vec<ScoredCandidate>> {
        let phases = self.phases.candidate_phases(&parent.journey, obs);
        if phases.is_empty() {
            return Err(TrackphaseError::InvariantViolation {
                details: format!("no candidate phases from parent {}", parent.journey),
            });
        }

        let mut scored = Vec::with_capacity(phases.len());
        for phase in phases {
            let block = self
                .blocks
                .transition_block_state(parent, motion, &phase, obs)
                .map_err(|source| TrackphaseError::UpstreamUnavailable { source })?;

            let state = VehicleState::new(edge.clone(), motion.clone(), block, phase, Arc::clone(obs));
            let likelihood = self
                .sensor
                .evaluate(&SensorContext::new(&state, obs, parent))?;

            trace!(
                phase = %state.journey.kind(),
                block = state.block.as_ref().map(|b| b.block_state.block_id.as_str()),
                log_p = likelihood.total_log_probability(),
                "candidate scored"
            );
            scored.push(ScoredCandidate { state, likelihood });
        }
        Ok(scored)
    }

    /// Runs one transition step and reports statistics.
    ///
    /// Exactly one uniform value is drawn from `rng` when a candidate is
    /// selectable; none when the step fails.
    pub fn step_with_stats<R: Rng + ?Sized>(
        &self,
        parent: &VehicleState,
        edge: EdgeState,
        motion: MotionState,
        obs: Arc<Observation>,
        rng: &mut R,
    ) -> Result<(VehicleState, StepStats)> {
        let span = debug_span!(
            "journey_step",
            vehicle = %obs.vehicle_id,
            parent = %parent.journey.kind()
        );
        let _enter = span.enter();

        let candidates = self.candidates(parent, &edge, &motion, &obs)?;
        let log_likelihoods: Vec<f64> = candidates.iter().map(ScoredCandidate::log_likelihood).collect();
        let weights = relative_weights(&log_likelihoods);

        let mut stats = StepStats {
            candidates: candidates.len(),
            ..StepStats::default()
        };
        let mut cdf = CdfMap::with_capacity(candidates.len());
        for (candidate, weight) in candidates.into_iter().zip(weights) {
            if candidate.state.block.is_some() {
                stats.assigned += 1;
            }
            if !cdf.put(weight, candidate.state) {
                stats.zero_weight += 1;
            }
        }

        let selected = cdf.sample(rng)?;
        debug!(
            phase = %selected.journey.kind(),
            deviation = selected.schedule_deviation(),
            selectable = stats.selectable(),
            "candidate selected"
        );
        Ok((selected, stats))
    }

    /// Runs one transition step.
    ///
    /// For access to step statistics, use `step_with_stats` instead.
    pub fn step<R: Rng + ?Sized>(
        &self,
        parent: &VehicleState,
        edge: EdgeState,
        motion: MotionState,
        obs: Arc<Observation>,
        rng: &mut R,
    ) -> Result<VehicleState> {
        self.step_with_stats(parent, edge, motion, obs, rng)
            .map(|(state, _)| state)
    }
}
