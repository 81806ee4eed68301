//! Schedule-deviation likelihood
//!
//! Scores how plausible a candidate's schedule deviation is under a fixed,
//! heavy-tailed prior centered on "on time". Phases without a directly
//! observable deviation get a generic penalty: the prior density at a high
//! percentile of the folded prior.

use std::sync::Arc;

use crate::config::SchedulePriorConfig;
use crate::types::distributions::{FoldedNormal, StudentT};
use crate::types::likelihood::Likelihood;
use crate::types::phase::JourneyPhase;
use crate::{Result, TrackphaseError};

use super::sensor::{SensorContext, SensorRule};

/// Prior over schedule deviation, in minutes.
///
/// Built once and shared between vehicles.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDeviationPrior {
    distribution: StudentT<f64>,
    generic_deviation: f64,
    generic_log_density: f64,
}

impl ScheduleDeviationPrior {
    /// Creates a Student-t prior and precomputes the generic penalty at the
    /// `null_state_quantile` of the matching folded normal.
    pub fn new(dof: f64, location: f64, scale: f64, null_state_quantile: f64) -> Result<Self> {
        if !(null_state_quantile > 0.0 && null_state_quantile < 1.0) {
            return Err(TrackphaseError::InvalidConfig {
                details: format!("null-state quantile {null_state_quantile} must lie in (0, 1)"),
            });
        }
        let distribution = StudentT::new(dof, location, scale)?;
        let generic_deviation = FoldedNormal::new(location, scale)?.inverse_cdf(null_state_quantile);
        let generic_log_density = distribution.ln_pdf(generic_deviation);

        Ok(Self {
            distribution,
            generic_deviation,
            generic_log_density,
        })
    }

    /// Builds the prior from configuration.
    pub fn from_config(config: &SchedulePriorConfig) -> Result<Self> {
        Self::new(
            config.degrees_of_freedom,
            config.location,
            config.scale,
            config.null_state_quantile,
        )
    }

    /// The underlying Student-t.
    pub fn distribution(&self) -> &StudentT<f64> {
        &self.distribution
    }

    /// Deviation (minutes) at which the generic penalty is evaluated.
    pub fn generic_deviation(&self) -> f64 {
        self.generic_deviation
    }

    /// Log density used when no deviation is observable.
    pub fn generic_log_density(&self) -> f64 {
        self.generic_log_density
    }

    /// Log density at `deviation` minutes.
    pub fn ln_density(&self, deviation: f64) -> f64 {
        self.distribution.ln_pdf(deviation)
    }
}

/// The `pSchedule` rule.
#[derive(Debug, Clone)]
pub struct ScheduleLikelihood {
    prior: Arc<ScheduleDeviationPrior>,
}

impl ScheduleLikelihood {
    /// Factor name contributed by this rule.
    pub const NAME: &'static str = "pSchedule";

    /// Creates the rule around a shared prior.
    pub fn new(prior: Arc<ScheduleDeviationPrior>) -> Self {
        Self { prior }
    }

    /// The prior in use.
    pub fn prior(&self) -> &ScheduleDeviationPrior {
        &self.prior
    }

    fn observed_deviation(deviation: f64, phase: &JourneyPhase) -> Result<f64> {
        if deviation.is_finite() {
            Ok(deviation)
        } else {
            Err(TrackphaseError::RuleEvaluation {
                rule: Self::NAME,
                details: format!("{} candidate has non-finite schedule deviation {deviation}", phase.kind()),
            })
        }
    }
}

impl SensorRule for ScheduleLikelihood {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn likelihood(&self, context: &SensorContext<'_>) -> Result<Likelihood> {
        let mut result = Likelihood::new(Self::NAME);
        let phase = &context.state.journey;
        let generic = self.prior.generic_log_density();

        let Some(block) = &context.state.block else {
            result.add_log_factor_and("null state", generic);
            return Ok(result);
        };

        match phase {
            JourneyPhase::DeadheadAfter => {
                result.add_log_factor_and("deadhead after", generic);
            }
            JourneyPhase::DeadheadBefore { .. } | JourneyPhase::LayoverBefore => {
                // Before the block starts a deviation is optional evidence
                let log_p = block
                    .finite_deviation()
                    .filter(|d| d.abs() > 0.0)
                    .map_or(generic, |d| self.prior.ln_density(d));
                let label = if phase.is_layover() {
                    "layover before"
                } else {
                    "deadhead before"
                };
                result.add_log_factor_and(label, log_p);
            }
            JourneyPhase::DeadheadDuring { .. } | JourneyPhase::LayoverDuring | JourneyPhase::InProgress => {
                let deviation = Self::observed_deviation(block.schedule_deviation, phase)?;
                let label = match phase {
                    JourneyPhase::InProgress => "in progress",
                    JourneyPhase::LayoverDuring => "layover during",
                    _ => "deadhead during",
                };
                result.add_log_factor_and(label, self.prior.ln_density(deviation));
            }
            // No schedule evidence either way at base or after the block
            JourneyPhase::AtBase | JourneyPhase::LayoverAfter => {}
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::block::{BlockState, BlockStateObservation};
    use crate::types::location::Location;
    use crate::types::observation::Observation;
    use crate::types::vehicle::{EdgeState, MotionState, VehicleState};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn candidate(phase: JourneyPhase, deviation: Option<f64>) -> VehicleState {
        let obs = Arc::new(Observation::new(
            "bus-9",
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            Location::new(40.7, -74.0),
        ));
        let block = deviation.map(|d| {
            BlockStateObservation::new(
                BlockState::new("B1", "T1", NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()),
                d,
            )
        });
        VehicleState::new(
            EdgeState::default(),
            MotionState::from_observation(&obs),
            block,
            phase,
            obs,
        )
    }

    fn score(rule: &ScheduleLikelihood, state: &VehicleState) -> Result<Likelihood> {
        rule.likelihood(&SensorContext::new(state, &state.observation, state))
    }

    fn rule() -> ScheduleLikelihood {
        let prior = ScheduleDeviationPrior::from_config(&SchedulePriorConfig::default()).unwrap();
        ScheduleLikelihood::new(Arc::new(prior))
    }

    #[test]
    fn test_default_generic_penalty() {
        let prior = ScheduleDeviationPrior::from_config(&SchedulePriorConfig::default()).unwrap();
        // Half-normal 95th percentile sits at 1.96 scale
        assert!((prior.generic_deviation() - 1.959_964).abs() < 1e-5);
        // Student-t with two degrees of freedom: (2 + x^2)^(-3/2)
        let expected = (2.0 + prior.generic_deviation().powi(2)).powf(-1.5).ln();
        assert!((prior.generic_log_density() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_in_progress_decays_away_from_zero() {
        let rule = rule();
        let p0 = score(&rule, &candidate(JourneyPhase::InProgress, Some(0.0))).unwrap();
        let p5 = score(&rule, &candidate(JourneyPhase::InProgress, Some(5.0))).unwrap();
        let p30 = score(&rule, &candidate(JourneyPhase::InProgress, Some(30.0))).unwrap();

        assert!(p0.total_log_probability() > p5.total_log_probability());
        assert!(p5.total_log_probability() > p30.total_log_probability());
        assert_eq!(p0.name(), "pSchedule");
        assert_eq!(p0.factors()[0].name(), "in progress");
    }

    #[test]
    fn test_null_state_uses_generic_penalty() {
        let rule = rule();
        let generic = rule.prior().generic_log_density();
        for phase in [
            JourneyPhase::AtBase,
            JourneyPhase::InProgress,
            JourneyPhase::LayoverBefore,
            JourneyPhase::DeadheadAfter,
        ] {
            let result = score(&rule, &candidate(phase, None)).unwrap();
            assert!((result.total_log_probability() - generic).abs() < 1e-12);
            assert_eq!(result.factors()[0].name(), "null state");
        }
    }

    #[test]
    fn test_deadhead_after_ignores_deviation() {
        let rule = rule();
        let generic = rule.prior().generic_log_density();
        let result = score(&rule, &candidate(JourneyPhase::DeadheadAfter, Some(12.0))).unwrap();
        assert!((result.total_log_probability() - generic).abs() < 1e-12);
    }

    #[test]
    fn test_before_phases_fall_back_on_zero_deviation() {
        let rule = rule();
        let generic = rule.prior().generic_log_density();
        let start = Location::new(40.6, -73.9);

        let zero = score(&rule, &candidate(JourneyPhase::deadhead_before(start), Some(0.0))).unwrap();
        assert!((zero.total_log_probability() - generic).abs() < 1e-12);

        let late = score(&rule, &candidate(JourneyPhase::LayoverBefore, Some(3.0))).unwrap();
        let expected = rule.prior().ln_density(3.0);
        assert!((late.total_log_probability() - expected).abs() < 1e-12);
        assert_eq!(late.factors()[0].name(), "layover before");
    }

    #[test]
    fn test_before_phases_treat_non_finite_deviation_as_generic() {
        let rule = rule();
        let generic = rule.prior().generic_log_density();

        let layover = score(&rule, &candidate(JourneyPhase::LayoverBefore, Some(f64::NAN))).unwrap();
        assert!((layover.total_log_probability() - generic).abs() < 1e-12);
        assert_eq!(layover.factors()[0].name(), "layover before");

        let start = Location::new(40.6, -73.9);
        let deadhead =
            score(&rule, &candidate(JourneyPhase::deadhead_before(start), Some(f64::INFINITY))).unwrap();
        assert!((deadhead.total_log_probability() - generic).abs() < 1e-12);
    }

    #[test]
    fn test_generic_penalty_below_on_time_density() {
        let rule = rule();
        let on_time = score(&rule, &candidate(JourneyPhase::InProgress, Some(0.0))).unwrap();
        assert!(on_time.total_log_probability() > rule.prior().generic_log_density());
    }

    #[test]
    fn test_non_finite_deviation_is_a_rule_failure() {
        let rule = rule();
        let err = score(&rule, &candidate(JourneyPhase::LayoverDuring, Some(f64::NAN))).unwrap_err();
        assert!(matches!(err, TrackphaseError::RuleEvaluation { rule: "pSchedule", .. }));
    }

    #[test]
    fn test_at_base_with_assignment_is_neutral() {
        let rule = rule();
        let result = score(&rule, &candidate(JourneyPhase::AtBase, Some(4.0))).unwrap();
        assert_eq!(result.total_log_probability(), 0.0);
        assert!(result.factors().is_empty());
    }

    #[test]
    fn test_invalid_quantile_rejected() {
        assert!(ScheduleDeviationPrior::new(2.0, 0.0, 1.0, 1.0).is_err());
        assert!(ScheduleDeviationPrior::new(2.0, 0.0, 1.0, 0.0).is_err());
    }
}
