//! Inference configuration.
//!
//! Loaded from TOML with kebab-case keys. Every field has a default, so an
//! empty document yields the standard rule set.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, TrackphaseError};

/// Top-level configuration for building a sensor model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InferenceConfig {
    /// Prior over schedule deviation used by `pSchedule`
    pub schedule_prior: SchedulePriorConfig,
    /// Enables the `pScheduleTransition` rule when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation_transition: Option<DeviationTransitionConfig>,
}

/// Student-t prior over schedule deviation, in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SchedulePriorConfig {
    /// Degrees of freedom
    pub degrees_of_freedom: f64,
    /// Center of the prior (minutes)
    pub location: f64,
    /// Scale of the prior (minutes)
    pub scale: f64,
    /// Folded-normal percentile at which the generic penalty is taken
    pub null_state_quantile: f64,
}

impl Default for SchedulePriorConfig {
    fn default() -> Self {
        Self {
            degrees_of_freedom: 2.0,
            location: 0.0,
            scale: 1.0,
            null_state_quantile: 0.95,
        }
    }
}

/// Spread of allowed schedule-deviation change between observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DeviationTransitionConfig {
    /// Standard deviation (minutes) per elapsed minute
    pub scale: f64,
    /// Floor on the standard deviation (minutes)
    pub min_std_dev: f64,
}

impl Default for DeviationTransitionConfig {
    fn default() -> Self {
        Self {
            scale: 0.4,
            min_std_dev: 0.1,
        }
    }
}

impl InferenceConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| TrackphaseError::ConfigParse {
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| TrackphaseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks every value is in range.
    pub fn validate(&self) -> Result<()> {
        let prior = &self.schedule_prior;
        positive("schedule-prior.degrees-of-freedom", prior.degrees_of_freedom)?;
        positive("schedule-prior.scale", prior.scale)?;
        if !prior.location.is_finite() {
            return Err(invalid(format!(
                "schedule-prior.location must be finite, got {}",
                prior.location
            )));
        }
        let q = prior.null_state_quantile;
        if !(q > 0.0 && q < 1.0) {
            return Err(invalid(format!(
                "schedule-prior.null-state-quantile must lie in (0, 1), got {q}"
            )));
        }

        if let Some(transition) = &self.deviation_transition {
            if !(transition.scale.is_finite() && transition.scale >= 0.0) {
                return Err(invalid(format!(
                    "deviation-transition.scale must be non-negative, got {}",
                    transition.scale
                )));
            }
            positive("deviation-transition.min-std-dev", transition.min_std_dev)?;
        }
        Ok(())
    }
}

fn invalid(details: String) -> TrackphaseError {
    TrackphaseError::InvalidConfig { details }
}

fn positive(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{key} must be positive, got {value}")))
    }
}
