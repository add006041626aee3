//! Implementations of the CLI subcommands.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use peacewatch_ai::analyzer::{AnalysisOutcome, PatternAnalyzer, run_local};
use peacewatch_ai::service::{HttpPatternService, ServiceConfig};
use peacewatch_analytics::summarize;
use peacewatch_analytics_models::{
    HistoryPoint, PatternAnalysisRequest, PredictionPoint, TrendSummary,
};
use peacewatch_incident_models::Incident;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading an input file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An input file did not contain the expected JSON.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        /// The offending file.
        path: String,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// The AI client could not be set up or the run was superseded.
    #[error(transparent)]
    Ai(#[from] peacewatch_ai::AiError),
}

/// Reads and deserializes a JSON file.
///
/// # Errors
///
/// Returns [`CliError`] if the file cannot be read or parsed.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: display,
        source,
    })
}

/// Options for the `analyze` command.
pub struct AnalyzeOptions {
    /// Analysis server base URL. Falls back to `ANALYSIS_ENDPOINT`.
    pub endpoint: Option<String>,
    /// Request timeout in seconds. Falls back to `ANALYSIS_TIMEOUT_SECS`.
    pub timeout_secs: Option<u64>,
    /// Category focus forwarded to the server.
    pub category: Option<String>,
    /// Region focus forwarded to the server.
    pub region: Option<String>,
    /// Timeframe label forwarded to the server.
    pub timeframe: Option<String>,
}

impl AnalyzeOptions {
    fn service_config(&self) -> Option<ServiceConfig> {
        let mut config = match (&self.endpoint, ServiceConfig::from_env()) {
            (Some(endpoint), env) => ServiceConfig {
                base_url: endpoint.clone(),
                timeout: env.map_or(peacewatch_ai::service::DEFAULT_TIMEOUT, |c| c.timeout),
            },
            (None, Some(env)) => env,
            (None, None) => return None,
        };
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        Some(config)
    }
}

/// Analyzes the incidents in `path`.
///
/// With an analysis endpoint configured, AI patterns are requested first
/// and the rule-based detectors are the fallback. Without one, only the
/// rule-based detectors run.
///
/// # Errors
///
/// Returns [`CliError`] if the input cannot be read or the HTTP client
/// cannot be built. Detector failures are reported as warnings.
pub async fn analyze(path: &Path, options: AnalyzeOptions) -> Result<AnalysisOutcome, CliError> {
    let incidents: Vec<Incident> = read_json(path)?;
    log::info!("Loaded {} incidents from {}", incidents.len(), path.display());

    let Some(config) = options.service_config() else {
        log::info!("No analysis endpoint configured; running rule-based analysis only");
        return Ok(run_local(&incidents, 0));
    };

    let service = HttpPatternService::new(&config)?;
    log::info!("Requesting AI patterns from {}", service.url());

    let analyzer = PatternAnalyzer::new(Arc::new(service)).with_timeout(config.timeout);
    let request = PatternAnalysisRequest {
        incidents,
        category: options.category,
        region: options.region,
        timeframe: options.timeframe,
    };

    Ok(analyzer.analyze(&request).await?)
}

/// Summarizes the history and prediction series in the given files.
///
/// # Errors
///
/// Returns [`CliError`] if either file cannot be read or parsed.
pub fn trends(history: &Path, prediction: &Path) -> Result<TrendSummary, CliError> {
    let history: Vec<HistoryPoint> = read_json(history)?;
    let prediction: Vec<PredictionPoint> = read_json(prediction)?;
    Ok(summarize(&history, &prediction))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("peacewatch_cli_tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn no_endpoint() -> AnalyzeOptions {
        AnalyzeOptions {
            endpoint: None,
            timeout_secs: None,
            category: None,
            region: None,
            timeframe: None,
        }
    }

    #[test]
    fn explicit_endpoint_with_timeout_override() {
        let options = AnalyzeOptions {
            endpoint: Some("http://analysis.local".to_string()),
            timeout_secs: Some(5),
            ..no_endpoint()
        };
        let config = options.service_config().unwrap();
        assert_eq!(config.base_url, "http://analysis.local");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn read_json_reports_path_on_bad_input() {
        let path = write_temp("bad.json", "{ not json");
        let err = read_json::<Vec<Incident>>(&path).unwrap_err();
        assert!(matches!(err, CliError::Json { .. }));
        assert!(err.to_string().contains("bad.json"));

        let missing = std::env::temp_dir().join("peacewatch_cli_tests/missing.json");
        assert!(matches!(
            read_json::<Vec<Incident>>(&missing),
            Err(CliError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn local_analysis_with_duplicate_ids_warns_instead_of_failing() {
        use peacewatch_ai::analyzer::{AnalysisWarning, PatternOrigin};

        let path = write_temp(
            "duplicate_ids.json",
            r#"[{"id": 1, "region": "A"}, {"id": 1, "region": "B"}]"#,
        );
        let outcome = analyze(&path, no_endpoint()).await.unwrap();

        assert!(outcome.patterns.is_empty());
        assert_eq!(outcome.origin, PatternOrigin::Unavailable);
        assert_eq!(outcome.warnings, vec![AnalysisWarning::AnalysisFailed]);
    }

    #[test]
    fn trends_from_files() {
        let history = write_temp(
            "history.json",
            r#"[{"date": "2024-01", "count": 10, "severity": 1.5, "region": "North", "category": "protest"}]"#,
        );
        let prediction = write_temp(
            "prediction.json",
            r#"[{"date": "2024-02", "predicted": 12.0, "lower": 9.0, "upper": 15.0, "anomaly": false, "confidence": 0.75}]"#,
        );

        let summary = trends(&history, &prediction).unwrap();
        assert_eq!(summary.series.len(), 2);
        assert_eq!(summary.headline.current, 10);
        assert!((summary.headline.percent_change.unwrap() - 20.0).abs() < 1e-9);
        assert!((summary.headline.confidence_pct - 75.0).abs() < 1e-9);
    }
}
