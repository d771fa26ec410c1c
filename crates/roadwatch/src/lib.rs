//! Highway condition survey ingestion.
//!
//! The library decodes positional NSV spreadsheet exports into lane-level
//! distress measurements, classifies them against configurable thresholds,
//! derives alerts for violations, and exposes the stored survey network
//! through a repository abstraction and an axum router.

pub mod config;
pub mod error;
pub mod survey;
pub mod telemetry;
