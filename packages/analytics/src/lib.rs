#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rule-based incident pattern detection and trend summarization.
//!
//! Incidents are grouped by month, weekday, region, severity, and
//! category. Buckets that stand out against the mean bucket size become
//! temporal, spatial, or actor patterns. Separately, historical and
//! predicted monthly series are merged into a chart series with headline
//! figures. Everything here is a pure function of its input.

pub mod grouping;
pub mod patterns;
pub mod scoring;
pub mod trends;

pub use patterns::analyze_incidents;
pub use trends::summarize;

use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Two incident records share an ID.
    #[error("Duplicate incident id {id}")]
    DuplicateIncidentId {
        /// The repeated ID.
        id: i64,
    },
}
