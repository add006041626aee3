//! Classification and coercion of AI pattern responses.
//!
//! Responses from the analysis endpoint or a language model are untrusted
//! JSON. Anything that is not a well-formed pattern payload is classified
//! as malformed; individual patterns with missing or invalid fields are
//! repaired with fixed defaults rather than rejected.

use std::collections::HashSet;

use peacewatch_analytics_models::{
    ActorPattern, PatternDimension, PatternSet, Relevance, SpatialPattern, TemporalPattern,
};
use serde_json::Value;

/// Default pattern name.
pub const DEFAULT_NAME: &str = "Unnamed Pattern";

/// Default pattern description.
pub const DEFAULT_DESCRIPTION: &str = "No description provided";

/// Significance assigned when the response has no numeric score.
pub const DEFAULT_SIGNIFICANCE: u8 = 50;

/// Relevance assigned when the response has no valid tier.
pub const DEFAULT_RELEVANCE: Relevance = Relevance::Medium;

/// Outcome of inspecting an analysis response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseKind {
    /// `aiGenerated` is `true` and `patterns` is an object.
    WithPatterns(PatternSet),
    /// The service answered but declined to produce AI patterns.
    Empty,
    /// Anything else.
    Malformed,
}

/// Classifies an analysis response body and coerces its patterns.
///
/// `known_ids` are the IDs of the incidents that were submitted; pattern
/// members outside that set are dropped.
#[must_use]
pub fn classify_response(body: &Value, known_ids: &HashSet<i64>) -> ResponseKind {
    let ai_generated = body.get("aiGenerated").and_then(Value::as_bool);
    let patterns = body.get("patterns").filter(|p| p.is_object());

    match (ai_generated, patterns) {
        (Some(true), Some(patterns)) => {
            ResponseKind::WithPatterns(coerce_pattern_set(patterns, known_ids))
        }
        (Some(false), Some(_)) => ResponseKind::Empty,
        _ => ResponseKind::Malformed,
    }
}

/// Coerces a `{temporal, spatial, actor}` object into a [`PatternSet`].
///
/// A dimension that is missing or not an array becomes an empty list.
#[must_use]
pub fn coerce_pattern_set(patterns: &Value, known_ids: &HashSet<i64>) -> PatternSet {
    let items = |dimension: PatternDimension| -> Vec<CoercedFields> {
        patterns
            .get(dimension.to_string())
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|item| CoercedFields::from_value(item, dimension, known_ids))
                    .collect()
            })
            .unwrap_or_default()
    };

    PatternSet {
        temporal: items(PatternDimension::Temporal)
            .into_iter()
            .map(|f| TemporalPattern {
                name: f.name,
                description: f.description,
                significance: f.significance,
                relevance: f.relevance,
                period: f.key,
                incidents: f.incidents,
            })
            .collect(),
        spatial: items(PatternDimension::Spatial)
            .into_iter()
            .map(|f| SpatialPattern {
                name: f.name,
                description: f.description,
                significance: f.significance,
                relevance: f.relevance,
                region: f.key,
                incidents: f.incidents,
            })
            .collect(),
        actor: items(PatternDimension::Actor)
            .into_iter()
            .map(|f| ActorPattern {
                name: f.name,
                description: f.description,
                significance: f.significance,
                relevance: f.relevance,
                actor: f.key,
                incidents: f.incidents,
            })
            .collect(),
    }
}

/// Fields shared by every pattern variant, after defaults are applied.
struct CoercedFields {
    name: String,
    description: String,
    significance: u8,
    relevance: Relevance,
    key: String,
    incidents: Vec<i64>,
}

impl CoercedFields {
    fn from_value(item: &Value, dimension: PatternDimension, known_ids: &HashSet<i64>) -> Self {
        Self {
            name: non_empty_str(item, "name").unwrap_or_else(|| DEFAULT_NAME.to_string()),
            description: non_empty_str(item, "description")
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            significance: item
                .get("significance")
                .and_then(Value::as_f64)
                .map_or(DEFAULT_SIGNIFICANCE, clamp_significance),
            relevance: item
                .get("relevance")
                .and_then(Value::as_str)
                .and_then(|r| r.parse().ok())
                .unwrap_or(DEFAULT_RELEVANCE),
            key: non_empty_str(item, dimension.key_field())
                .unwrap_or_else(|| dimension.unknown_key().to_string()),
            incidents: item
                .get("incidents")
                .and_then(Value::as_array)
                .map(|ids| {
                    ids.iter()
                        .filter_map(integral_id)
                        .filter(|id| known_ids.contains(id))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

fn non_empty_str(item: &Value, field: &str) -> Option<String> {
    item.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Integer IDs, plus floats with no fractional part (`3.0`).
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn integral_id(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_significance(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
