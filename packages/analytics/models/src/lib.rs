#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pattern, trend, and analysis request types for incident analytics.
//!
//! Patterns and trend summaries are derived, ephemeral values: they are
//! rebuilt from scratch on every analysis run and never persisted. The
//! JSON shapes here are the wire contract of the analysis endpoints and
//! of the dashboard that renders them.

use peacewatch_incident_models::Incident;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How strongly a pattern deviates from the baseline.
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
pub enum Relevance {
    /// Marginal deviation
    Low,
    /// Clear deviation worth monitoring
    Medium,
    /// Strong deviation that warrants attention
    High,
}

/// The grouping dimension a pattern was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PatternDimension {
    /// Month and weekday concentrations.
    Temporal,
    /// Regional concentrations.
    Spatial,
    /// Perpetrator and category concentrations.
    Actor,
}

impl PatternDimension {
    /// Name of the JSON field that carries this dimension's grouping key.
    #[must_use]
    pub const fn key_field(self) -> &'static str {
        match self {
            Self::Temporal => "period",
            Self::Spatial => "region",
            Self::Actor => "actor",
        }
    }

    /// Placeholder used when a pattern is missing its grouping key.
    #[must_use]
    pub const fn unknown_key(self) -> &'static str {
        match self {
            Self::Temporal => "Unknown period",
            Self::Spatial => "Unknown region",
            Self::Actor => "Unknown actor",
        }
    }
}

/// A concentration of incidents in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalPattern {
    /// Human-readable label.
    pub name: String,
    /// Sentence describing the deviation.
    pub description: String,
    /// Score in `[0, 100]`.
    pub significance: u8,
    /// Relevance tier.
    pub relevance: Relevance,
    /// Period label (e.g. "March 2024" or "Saturdays").
    pub period: String,
    /// Contributing incident IDs.
    pub incidents: Vec<i64>,
}

/// A concentration of incidents in one administrative region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialPattern {
    /// Human-readable label.
    pub name: String,
    /// Sentence describing the deviation.
    pub description: String,
    /// Score in `[0, 100]`.
    pub significance: u8,
    /// Relevance tier.
    pub relevance: Relevance,
    /// Region name, verbatim from the incident records.
    pub region: String,
    /// Contributing incident IDs.
    pub incidents: Vec<i64>,
}

/// A recurring perpetrator profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorPattern {
    /// Human-readable label.
    pub name: String,
    /// Sentence describing the deviation.
    pub description: String,
    /// Score in `[0, 100]`.
    pub significance: u8,
    /// Relevance tier.
    pub relevance: Relevance,
    /// Suspected actor.
    pub actor: String,
    /// Contributing incident IDs.
    pub incidents: Vec<i64>,
}

/// The three pattern lists produced by one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSet {
    /// Month patterns followed by weekday patterns.
    pub temporal: Vec<TemporalPattern>,
    /// Regional patterns.
    pub spatial: Vec<SpatialPattern>,
    /// Severity pattern (if any) followed by category patterns.
    pub actor: Vec<ActorPattern>,
}

impl PatternSet {
    /// Total number of patterns across all dimensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.temporal.len() + self.spatial.len() + self.actor.len()
    }

    /// Returns `true` if no dimension produced a pattern.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Request body for `POST /api/analysis/patterns`.
///
/// The optional filters are forwarded as context and are not checked
/// against any allow-list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternAnalysisRequest {
    /// Incidents to analyze.
    pub incidents: Vec<Incident>,
    /// Category the caller is focused on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Region the caller is focused on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Free-form timeframe label (e.g. "last_30_days").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
}

/// Response body of `POST /api/analysis/patterns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternAnalysisResponse {
    /// Detected patterns.
    pub patterns: PatternSet,
    /// Whether the patterns came from the language model rather than the
    /// rule-based detectors.
    pub ai_generated: bool,
}

/// One month of observed incident activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    /// Month in `YYYY-MM` form.
    pub date: String,
    /// Incidents observed in the month.
    pub count: u64,
    /// Mean severity of the month's incidents.
    pub severity: f64,
    /// Region the series belongs to.
    #[serde(default)]
    pub region: String,
    /// Category the series belongs to.
    #[serde(default)]
    pub category: String,
}

/// One month of model-predicted incident activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionPoint {
    /// Month in `YYYY-MM` form.
    pub date: String,
    /// Predicted incident count.
    pub predicted: f64,
    /// Lower bound of the prediction interval.
    pub lower: f64,
    /// Upper bound of the prediction interval.
    pub upper: f64,
    /// Whether the model flagged the month as anomalous.
    #[serde(default)]
    pub anomaly: bool,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
}

/// A point on the merged history/prediction chart axis.
///
/// Exactly one of `actual` and `predicted` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedSeriesPoint {
    /// Month in `YYYY-MM` form.
    pub date: String,
    /// Observed count for historical months.
    pub actual: Option<f64>,
    /// Predicted count for future months.
    pub predicted: Option<f64>,
    /// Lower prediction bound for future months.
    pub lower: Option<f64>,
    /// Upper prediction bound for future months.
    pub upper: Option<f64>,
}

/// Headline figures shown above the forecast chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendHeadline {
    /// Count of the most recent historical month.
    pub current: u64,
    /// Predicted count of the earliest predicted month.
    pub next_predicted: f64,
    /// Month-over-month change in percent. `None` when `current` is zero.
    pub percent_change: Option<f64>,
    /// Confidence of the earliest prediction, in percent.
    pub confidence_pct: f64,
}

/// Output of the trend/anomaly summarizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    /// Merged series sorted ascending by date.
    pub series: Vec<CombinedSeriesPoint>,
    /// Dates of predictions flagged as anomalous, in input order.
    pub anomaly_dates: Vec<String>,
    /// Headline figures.
    pub headline: TrendHeadline,
}

/// Request body for `POST /api/analysis/trends`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendRequest {
    /// Observed months.
    #[serde(default)]
    pub history: Vec<HistoryPoint>,
    /// Predicted months.
    #[serde(default)]
    pub prediction: Vec<PredictionPoint>,
}
