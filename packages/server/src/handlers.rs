//! HTTP handler functions for the analysis API.

use actix_web::{HttpResponse, web};
use peacewatch_ai::agent;
use peacewatch_analytics::{analyze_incidents, summarize};
use peacewatch_analytics_models::{PatternAnalysisRequest, PatternAnalysisResponse, TrendRequest};
use peacewatch_server_models::{ApiError, ApiHealth};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        ai_enabled: state.provider.is_some(),
    })
}

/// `POST /api/analysis/patterns`
///
/// Asks the configured LLM provider for patterns. Without a provider, or
/// when the provider fails, answers with the rule-based patterns and
/// `aiGenerated: false`.
pub async fn analyze_patterns(
    state: web::Data<AppState>,
    body: web::Json<PatternAnalysisRequest>,
) -> HttpResponse {
    let request = body.into_inner();

    if let Some(provider) = &state.provider {
        match agent::generate_patterns(provider.as_ref(), &request).await {
            Ok(patterns) => {
                return HttpResponse::Ok().json(PatternAnalysisResponse {
                    patterns,
                    ai_generated: true,
                });
            }
            Err(e) => {
                log::warn!("LLM pattern analysis failed, using rule-based analysis: {e}");
            }
        }
    }

    match analyze_incidents(&request.incidents) {
        Ok(patterns) => HttpResponse::Ok().json(PatternAnalysisResponse {
            patterns,
            ai_generated: false,
        }),
        Err(e) => {
            log::error!("Failed to analyze patterns: {e}");
            HttpResponse::UnprocessableEntity().json(ApiError::new(format!(
                "Failed to analyze patterns: {e}"
            )))
        }
    }
}

/// `POST /api/analysis/trends`
///
/// Merges history and prediction into a chart series with headline
/// figures.
pub async fn summarize_trends(body: web::Json<TrendRequest>) -> HttpResponse {
    let summary = summarize(&body.history, &body.prediction);
    log::debug!(
        "Summarized {} series points, {} anomalies",
        summary.series.len(),
        summary.anomaly_dates.len()
    );
    HttpResponse::Ok().json(summary)
}
