//! Core value types: observations, phases, assignments, vehicle states and likelihoods

pub mod block;
pub mod distributions;
pub mod likelihood;
pub mod location;
pub mod observation;
pub mod phase;
pub mod vehicle;
