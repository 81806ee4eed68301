//! Trackphase: journey-phase inference for transit vehicles
//!
//! A particle-filter style inference core that, for each noisy position
//! report, proposes candidate journey phases for a vehicle, pairs each with a
//! schedule assignment, scores the candidates with pluggable sensor rules and
//! draws one survivor by weighted sampling.
//!
//! # Features
//!
//! - **Tagged phases**: deadhead phases carry their start location in the variant itself
//! - **Log-space likelihoods**: factors combine without underflow and keep full provenance
//! - **Reproducible sampling**: every random draw comes from an injected, seedable source
//!
//! # Layout
//!
//! - [`types`]: value types (observations, phases, block assignments, vehicle states,
//!   likelihoods, distributions)
//! - [`models`]: the phase state machine, the block-assignment seam and the sensor rules
//! - [`filters`]: the single-step journey transition driver
//! - [`utils`]: the cumulative weight sampler
//! - [`config`]: TOML configuration for the rule set

use std::path::PathBuf;

use thiserror::Error;

pub mod config;
pub mod filters;
pub mod models;
pub mod types;
pub mod utils;

pub mod prelude {
    //! Commonly used types, re-exported for convenience.
    pub use crate::config::*;
    pub use crate::filters::journey::*;
    pub use crate::models::*;
    pub use crate::types::block::*;
    pub use crate::types::likelihood::*;
    pub use crate::types::location::*;
    pub use crate::types::observation::*;
    pub use crate::types::phase::*;
    pub use crate::types::vehicle::*;
    pub use crate::utils::*;
    pub use crate::{Result, TrackphaseError};
}

/// Boxed error returned by external collaborators such as block-assignment services.
pub type UpstreamError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for the library
#[derive(Debug, Error)]
pub enum TrackphaseError {
    /// A phase label outside the journey-phase enumeration
    #[error("[TPH-1001] unknown journey phase: {value}")]
    UnknownPhase {
        /// The offending label
        value: String,
    },

    /// A structural invariant of the inference core was broken
    #[error("[TPH-1002] invariant violated: {details}")]
    InvariantViolation {
        /// What was broken
        details: String,
    },

    /// The sampler had no candidate with positive weight
    #[error("[TPH-2001] empty distribution: no positive weight among {offered} candidates")]
    EmptyDistribution {
        /// Number of candidates offered to the sampler
        offered: usize,
    },

    /// A sensor rule could not compute its contribution
    #[error("[TPH-2002] sensor rule {rule} could not be evaluated: {details}")]
    RuleEvaluation {
        /// Name of the failing rule
        rule: &'static str,
        /// Why it failed
        details: String,
    },

    /// The block-assignment collaborator failed
    #[error("[TPH-2003] block assignment unavailable: {source}")]
    UpstreamUnavailable {
        /// Error reported by the service
        #[source]
        source: UpstreamError,
    },

    /// Configuration values are out of range
    #[error("[TPH-3001] invalid configuration: {details}")]
    InvalidConfig {
        /// Which value and why
        details: String,
    },

    /// Configuration text could not be parsed
    #[error("[TPH-3002] configuration parse failure: {details}")]
    ConfigParse {
        /// Parser message
        details: String,
    },

    /// Configuration file could not be read
    #[error("[TPH-3003] IO failure at {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl TrackphaseError {
    /// Stable machine-parseable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownPhase { .. } => "TPH-1001",
            Self::InvariantViolation { .. } => "TPH-1002",
            Self::EmptyDistribution { .. } => "TPH-2001",
            Self::RuleEvaluation { .. } => "TPH-2002",
            Self::UpstreamUnavailable { .. } => "TPH-2003",
            Self::InvalidConfig { .. } => "TPH-3001",
            Self::ConfigParse { .. } => "TPH-3002",
            Self::Io { .. } => "TPH-3003",
        }
    }

    /// Returns true for programming defects that must abort the step rather than be retried.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownPhase { .. } | Self::InvariantViolation { .. }
        )
    }
}

/// Shared `Result` alias for the crate.
pub type Result<T> = ::core::result::Result<T, TrackphaseError>;
