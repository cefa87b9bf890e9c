//! Data and scoring layer for fleet-score.
//!
//! Reads a telematics movement report, normalises it into trip-tagged event
//! records and runs the driver-behaviour analyzers over them.

pub mod analysis;
pub mod braking;
pub mod night;
pub mod preprocess;
pub mod reader;
pub mod speed_limit;
pub mod speeding;
pub mod trips;

pub use score_core as core;
