//! Journey inference filters
//!
//! - [`journey::JourneyFilter`]: single-step transition and resampling of one
//!   vehicle's journey state

pub mod journey;
