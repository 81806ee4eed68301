//! Model traits for journey inference
//!
//! This module defines the seams of the inference step: which phases a
//! vehicle may move into, which schedule assignment each candidate gets, and
//! how candidates are scored against an observation.

mod block;
mod deviation;
mod journey;
mod schedule;
mod sensor;

pub use block::*;
pub use deviation::*;
pub use journey::*;
pub use schedule::*;
pub use sensor::*;
