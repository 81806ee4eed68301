//! Utility functions for journey inference
//!
//! Weighted candidate sampling.

mod sampling;

pub use sampling::*;
