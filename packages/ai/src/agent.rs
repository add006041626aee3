//! LLM-backed pattern generation.
//!
//! Builds a prompt from the submitted incidents, asks the model for a JSON
//! pattern set, and coerces whatever comes back into a [`PatternSet`].

use std::collections::HashSet;

use peacewatch_analytics_models::{PatternAnalysisRequest, PatternSet};
use peacewatch_incident_models::Incident;

use crate::AiError;
use crate::coerce::coerce_pattern_set;
use crate::providers::{LlmProvider, Message, StopReason};

/// Maximum number of incidents included in the prompt.
/// Keeps large submissions inside the model's context window.
const MAX_PROMPT_INCIDENTS: usize = 500;

fn build_system_prompt(request: &PatternAnalysisRequest) -> String {
    let focus = [
        request.category.as_deref().map(|c| format!("category \"{c}\"")),
        request.region.as_deref().map(|r| format!("region \"{r}\"")),
        request.timeframe.as_deref().map(|t| format!("timeframe \"{t}\"")),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();

    let focus = if focus.is_empty() {
        "no particular focus".to_string()
    } else {
        focus.join(", ")
    };

    format!(
        r#"You are a conflict early-warning analyst. You receive incident reports from field monitors and identify patterns that may signal escalating violence.

## Task
Identify temporal, spatial, and actor-based patterns in the incidents. The analyst is interested in: {focus}.

## Output
Respond with a single JSON object and nothing else:
{{
  "temporal": [{{ "name": string, "description": string, "significance": 0-100, "relevance": "high"|"medium"|"low", "period": string, "incidents": [incident ids] }}],
  "spatial":  [{{ "name": string, "description": string, "significance": 0-100, "relevance": "high"|"medium"|"low", "region": string, "incidents": [incident ids] }}],
  "actor":    [{{ "name": string, "description": string, "significance": 0-100, "relevance": "high"|"medium"|"low", "actor": string, "incidents": [incident ids] }}]
}}

## Instructions
1. Only reference incident ids that appear in the input.
2. Base every pattern on the incidents provided. Do NOT invent incidents.
3. Use an empty array for a dimension with no meaningful pattern.
4. Today's date is {today}."#,
        today = chrono::Utc::now().format("%Y-%m-%d"),
    )
}

fn build_user_message(incidents: &[Incident]) -> Result<String, AiError> {
    let shown = &incidents[..incidents.len().min(MAX_PROMPT_INCIDENTS)];
    let json = serde_json::to_string(shown)?;

    if shown.len() < incidents.len() {
        Ok(format!(
            "Incidents (first {} of {}):\n{json}",
            shown.len(),
            incidents.len()
        ))
    } else {
        Ok(format!("Incidents ({}):\n{json}", incidents.len()))
    }
}

/// Asks the model for patterns in the request's incidents.
///
/// # Errors
///
/// Returns [`AiError`] if the provider call fails or the model's reply
/// contains no JSON object.
pub async fn generate_patterns(
    provider: &dyn LlmProvider,
    request: &PatternAnalysisRequest,
) -> Result<PatternSet, AiError> {
    let system_prompt = build_system_prompt(request);
    let messages = vec![Message::user(build_user_message(&request.incidents)?)];

    log::info!(
        "Requesting LLM pattern analysis for {} incidents",
        request.incidents.len()
    );

    let response = provider.chat(&system_prompt, &messages).await?;

    if response.stop_reason == StopReason::MaxTokens {
        log::warn!("LLM response hit the token limit; attempting to parse anyway");
    }

    let value = extract_json_object(&response.text).ok_or_else(|| AiError::Provider {
        message: "LLM response did not contain a JSON object".to_string(),
    })?;

    // Some models wrap the dimensions in a `patterns` key.
    let patterns = value.get("patterns").filter(|p| p.is_object()).unwrap_or(&value);

    let known_ids: HashSet<i64> = request.incidents.iter().map(|i| i.id).collect();
    Ok(coerce_pattern_set(patterns, &known_ids))
}

/// Extracts the outermost JSON object from model output, tolerating
/// surrounding prose and markdown code fences.
fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<serde_json::Value>(&text[start..=end])
        .ok()
        .filter(serde_json::Value::is_object)
}
