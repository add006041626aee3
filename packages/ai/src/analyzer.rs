//! AI-assisted pattern analysis with rule-based fallback.
//!
//! One analysis run asks the remote [`PatternService`] first. Only a
//! response that is marked `aiGenerated` and carries a `patterns` object is
//! used; every other outcome (transport error, timeout, non-2xx, a
//! declined or malformed body) falls back to the local detectors with a
//! warning. If the local detectors fail too, the run still completes with
//! empty pattern lists and a second warning.
//!
//! Runs are numbered. Starting a new run cancels any run still waiting on
//! the service, so a slow stale response can never overwrite a newer one.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use peacewatch_analytics::analyze_incidents;
use peacewatch_analytics_models::{PatternAnalysisRequest, PatternSet};
use peacewatch_incident_models::Incident;
use serde::Serialize;
use tokio::sync::watch;

use crate::AiError;
use crate::coerce::{ResponseKind, classify_response};
use crate::service::{DEFAULT_TIMEOUT, PatternService};

/// Where the patterns of an [`AnalysisOutcome`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternOrigin {
    /// The remote service returned usable AI patterns.
    Ai,
    /// The local rule-based detectors produced the patterns.
    RuleBased,
    /// Both paths failed; the pattern lists are empty.
    Unavailable,
}

/// Non-fatal problems surfaced to the caller alongside the patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisWarning {
    /// The AI path failed and rule-based analysis was used instead.
    AiUnavailable,
    /// The rule-based detectors failed; the result is empty.
    AnalysisFailed,
}

impl std::fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AiUnavailable => write!(f, "AI analysis unavailable; used rule-based analysis"),
            Self::AnalysisFailed => write!(f, "Failed to analyze patterns"),
        }
    }
}

/// The state a remote request settled in.
#[derive(Debug)]
pub enum OverrideState {
    /// Usable AI patterns, already coerced.
    SuccessWithPatterns(PatternSet),
    /// The service answered with `aiGenerated: false`.
    SuccessEmpty,
    /// Transport failure, timeout, or non-2xx status.
    HttpError(AiError),
    /// The body was not a pattern payload.
    Malformed,
}

impl std::fmt::Display for OverrideState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuccessWithPatterns(set) => write!(f, "{} AI patterns", set.len()),
            Self::SuccessEmpty => write!(f, "service declined AI analysis"),
            Self::HttpError(e) => write!(f, "{e}"),
            Self::Malformed => write!(f, "malformed response"),
        }
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    /// Detected patterns.
    pub patterns: PatternSet,
    /// Where the patterns came from.
    pub origin: PatternOrigin,
    /// Warnings to show the user, in the order they occurred.
    pub warnings: Vec<AnalysisWarning>,
    /// Run number, for discarding results of superseded runs.
    pub generation: u64,
}

/// Runs AI-assisted analysis against a [`PatternService`].
pub struct PatternAnalyzer {
    service: Arc<dyn PatternService>,
    timeout: Duration,
    generation: watch::Sender<u64>,
}

impl PatternAnalyzer {
    /// Creates an analyzer with the default timeout.
    #[must_use]
    pub fn new(service: Arc<dyn PatternService>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            service,
            timeout: DEFAULT_TIMEOUT,
            generation,
        }
    }

    /// Overrides the remote request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Analyzes the request's incidents.
    ///
    /// Failures of the AI path and of the local detectors are reported as
    /// [`AnalysisOutcome::warnings`], never as errors.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Superseded`] if another run started while this
    /// one was waiting on the service.
    pub async fn analyze(
        &self,
        request: &PatternAnalysisRequest,
    ) -> Result<AnalysisOutcome, AiError> {
        let generation = self.next_generation();
        let mut updates = self.generation.subscribe();

        let response = tokio::select! {
            biased;
            () = superseded(&mut updates, generation) => {
                log::info!("Pattern analysis run {generation} superseded; discarding");
                return Err(AiError::Superseded { generation });
            }
            response = tokio::time::timeout(
                self.timeout,
                self.service.request_patterns(request),
            ) => response.unwrap_or_else(|_| Err(AiError::Timeout {
                seconds: self.timeout.as_secs_f64(),
            })),
        };

        let state = settle(response, request);
        log::debug!("Pattern analysis run {generation}: {state}");

        Ok(match state {
            OverrideState::SuccessWithPatterns(patterns) => AnalysisOutcome {
                patterns,
                origin: PatternOrigin::Ai,
                warnings: Vec::new(),
                generation,
            },
            other => {
                log::warn!("AI pattern analysis unavailable ({other}); using rule-based analysis");
                fallback(request, generation)
            }
        })
    }

    fn next_generation(&self) -> u64 {
        let mut generation = 0;
        self.generation.send_modify(|current| {
            *current += 1;
            generation = *current;
        });
        generation
    }
}

/// Completes once a run newer than `generation` has started.
async fn superseded(updates: &mut watch::Receiver<u64>, generation: u64) {
    if updates
        .wait_for(|current| *current != generation)
        .await
        .is_err()
    {
        std::future::pending::<()>().await;
    }
}

fn settle(
    response: Result<serde_json::Value, AiError>,
    request: &PatternAnalysisRequest,
) -> OverrideState {
    let body = match response {
        Ok(body) => body,
        Err(e) => return OverrideState::HttpError(e),
    };

    let known_ids: HashSet<i64> = request.incidents.iter().map(|i| i.id).collect();

    match classify_response(&body, &known_ids) {
        ResponseKind::WithPatterns(patterns) => OverrideState::SuccessWithPatterns(patterns),
        ResponseKind::Empty => OverrideState::SuccessEmpty,
        ResponseKind::Malformed => OverrideState::Malformed,
    }
}

fn fallback(request: &PatternAnalysisRequest, generation: u64) -> AnalysisOutcome {
    let mut outcome = run_local(&request.incidents, generation);
    outcome.warnings.insert(0, AnalysisWarning::AiUnavailable);
    outcome
}

/// Runs only the rule-based detectors.
///
/// A detector failure is logged and reported as empty pattern lists with
/// an [`AnalysisWarning::AnalysisFailed`] warning.
#[must_use]
pub fn run_local(incidents: &[Incident], generation: u64) -> AnalysisOutcome {
    match analyze_incidents(incidents) {
        Ok(patterns) => AnalysisOutcome {
            patterns,
            origin: PatternOrigin::RuleBased,
            warnings: Vec::new(),
            generation,
        },
        Err(e) => {
            log::error!("Rule-based pattern analysis failed: {e}");
            AnalysisOutcome {
                patterns: PatternSet::default(),
                origin: PatternOrigin::Unavailable,
                warnings: vec![AnalysisWarning::AnalysisFailed],
                generation,
            }
        }
    }
}
