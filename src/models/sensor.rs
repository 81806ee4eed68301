//! Sensor model: rule-based candidate scoring
//!
//! A [`SensorModel`] holds an ordered list of [`SensorRule`]s and ANDs their
//! contributions into one [`Likelihood`] per candidate.

use core::fmt;

use tracing::trace;

use crate::config::InferenceConfig;
use crate::types::likelihood::Likelihood;
use crate::types::observation::Observation;
use crate::types::vehicle::VehicleState;
use crate::Result;

use super::deviation::ScheduleDeviationTransitionRule;
use super::schedule::{ScheduleDeviationPrior, ScheduleLikelihood};

/// Everything a rule may look at when scoring one candidate.
#[derive(Debug, Clone, Copy)]
pub struct SensorContext<'a> {
    /// The candidate being scored
    pub state: &'a VehicleState,
    /// The observation being explained
    pub observation: &'a Observation,
    /// The surviving state from the previous step
    pub parent: &'a VehicleState,
}

impl<'a> SensorContext<'a> {
    /// Bundles a candidate with its observation and parent.
    pub fn new(state: &'a VehicleState, observation: &'a Observation, parent: &'a VehicleState) -> Self {
        Self {
            state,
            observation,
            parent,
        }
    }
}

/// Trait for a single likelihood rule.
///
/// Rules are pure functions of the context. A rule that cannot compute its
/// value must return [`crate::TrackphaseError::RuleEvaluation`], never a
/// zero probability, so callers can tell bad data from an implausible
/// candidate.
pub trait SensorRule: Send + Sync {
    /// Name of the factor this rule contributes, e.g. `pSchedule`.
    fn name(&self) -> &'static str;

    /// Scores the candidate in `context`.
    fn likelihood(&self, context: &SensorContext<'_>) -> Result<Likelihood>;
}

/// An ordered collection of sensor rules.
#[derive(Default)]
pub struct SensorModel {
    rules: Vec<Box<dyn SensorRule>>,
}

impl SensorModel {
    /// Creates a model with no rules; every candidate scores probability one.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Appends a rule, builder style.
    pub fn with_rule(mut self, rule: impl SensorRule + 'static) -> Self {
        self.push(rule);
        self
    }

    /// Appends a rule.
    pub fn push(&mut self, rule: impl SensorRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Builds the configured rule set.
    ///
    /// The schedule rule is always present; the deviation-transition rule is
    /// added when configured.
    pub fn from_config(config: &InferenceConfig) -> Result<Self> {
        config.validate()?;
        let prior = ScheduleDeviationPrior::from_config(&config.schedule_prior)?;
        let mut model = SensorModel::new().with_rule(ScheduleLikelihood::new(prior.into()));
        if let Some(transition) = &config.deviation_transition {
            model.push(ScheduleDeviationTransitionRule::new(
                transition.scale,
                transition.min_std_dev,
            )?);
        }
        Ok(model)
    }

    /// Names of the rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no rules are configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates every rule for the candidate and ANDs the results.
    ///
    /// The first rule failure aborts the evaluation.
    pub fn evaluate(&self, context: &SensorContext<'_>) -> Result<Likelihood> {
        let mut result = Likelihood::new("pVehicleState");
        for rule in &self.rules {
            let contribution = rule.likelihood(context)?;
            trace!(
                rule = rule.name(),
                log_p = contribution.total_log_probability(),
                "rule evaluated"
            );
            result.add_result_and(contribution);
        }
        Ok(result)
    }
}

impl fmt::Debug for SensorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorModel")
            .field("rules", &self.rule_names())
            .finish()
    }
}
