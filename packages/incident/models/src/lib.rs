#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record types and severity definitions.
//!
//! Incidents are owned by the reporting layer; the analysis crates treat
//! them as immutable read-only records. Every field other than the id may
//! be missing, and each grouping dimension skips the records that lack it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Severity tier assigned to an incident report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IncidentSeverity {
    /// Isolated or low-impact events
    Low,
    /// Events with local impact that warrant monitoring
    Medium,
    /// Violent or escalatory events requiring a response
    High,
}

/// A reported incident as consumed by the analysis pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Unique incident ID.
    pub id: i64,
    /// When the incident was reported. Unreported times are excluded from
    /// temporal grouping.
    #[serde(default)]
    pub reported_at: Option<DateTime<Utc>>,
    /// Administrative region the incident occurred in.
    #[serde(default)]
    pub region: Option<String>,
    /// Severity as stored by the reporting layer (`low`, `medium`, `high`).
    ///
    /// Kept verbatim so that grouping does not depend on the value being
    /// one of the known tiers.
    #[serde(default)]
    pub severity: Option<String>,
    /// Free-form incident category (e.g. `armed_clash`, `protest`).
    #[serde(default)]
    pub category: Option<String>,
    /// Short headline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Narrative description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Incident {
    /// Parses the stored severity string into a known tier, if it is one.
    ///
    /// Matching is exact: `"High"` is not the `high` tier.
    #[must_use]
    pub fn severity_level(&self) -> Option<IncidentSeverity> {
        self.severity.as_deref().and_then(|s| s.parse().ok())
    }
}
