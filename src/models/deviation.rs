//! Schedule-deviation continuity
//!
//! Between two observations on the same run, a vehicle's schedule deviation
//! can only drift so far. This rule scores the change in deviation against a
//! normal whose spread grows with the elapsed time.

use crate::types::distributions::Normal;
use crate::types::likelihood::Likelihood;
use crate::{Result, TrackphaseError};

use super::sensor::{SensorContext, SensorRule};

/// The `pScheduleTransition` rule.
///
/// Neutral when either side has no assignment, when the run changed, or when
/// the observation has no predecessor to measure elapsed time against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleDeviationTransitionRule {
    scale: f64,
    min_std_dev: f64,
}

impl ScheduleDeviationTransitionRule {
    /// Factor name contributed by this rule.
    pub const NAME: &'static str = "pScheduleTransition";

    /// Creates the rule.
    ///
    /// `scale` is minutes of deviation drift per elapsed minute; `min_std_dev`
    /// floors the spread for observations arriving close together.
    pub fn new(scale: f64, min_std_dev: f64) -> Result<Self> {
        if !(scale.is_finite() && scale >= 0.0) {
            return Err(TrackphaseError::InvalidConfig {
                details: format!("deviation transition scale {scale} must be finite and non-negative"),
            });
        }
        if !(min_std_dev.is_finite() && min_std_dev > 0.0) {
            return Err(TrackphaseError::InvalidConfig {
                details: format!("deviation transition min-std-dev {min_std_dev} must be positive"),
            });
        }
        Ok(Self { scale, min_std_dev })
    }

    /// Drift per elapsed minute.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Lower bound on the spread.
    pub fn min_std_dev(&self) -> f64 {
        self.min_std_dev
    }

    /// Spread of the allowed deviation change after `elapsed_minutes`.
    pub fn std_dev_for(&self, elapsed_minutes: f64) -> f64 {
        (elapsed_minutes.abs() * self.scale).max(self.min_std_dev)
    }
}

impl SensorRule for ScheduleDeviationTransitionRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn likelihood(&self, context: &SensorContext<'_>) -> Result<Likelihood> {
        let mut result = Likelihood::new(Self::NAME);

        let (Some(current), Some(previous)) = (&context.state.block, &context.parent.block) else {
            return Ok(result);
        };
        if !current.block_state.same_run(&previous.block_state) {
            return Ok(result);
        }
        let Some(elapsed) = context.observation.elapsed_since_previous() else {
            return Ok(result);
        };

        let (Some(dev), Some(prev_dev)) = (current.finite_deviation(), previous.finite_deviation()) else {
            return Err(TrackphaseError::RuleEvaluation {
                rule: Self::NAME,
                details: format!(
                    "non-finite deviation (current {}, previous {})",
                    current.schedule_deviation, previous.schedule_deviation
                ),
            });
        };

        let elapsed_minutes = elapsed.num_milliseconds() as f64 / 60_000.0;
        let normal = Normal::new(prev_dev, self.std_dev_for(elapsed_minutes))?;
        result.add_log_factor_and("deviation change", normal.ln_pdf(dev));
        Ok(result)
    }
}
