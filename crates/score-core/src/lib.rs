//! Shared domain types for fleet-score.
//!
//! Record model, error type, CLI settings, report-field parsers and the
//! formatting helpers used when rendering a driver report.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
