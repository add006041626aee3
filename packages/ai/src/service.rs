//! Remote pattern analysis service.
//!
//! The [`PatternService`] trait is the seam between the override logic and
//! the network: [`HttpPatternService`] posts to a running analysis server,
//! tests substitute canned implementations.

use std::time::Duration;

use peacewatch_analytics_models::PatternAnalysisRequest;

use crate::AiError;

/// Path of the pattern analysis endpoint, relative to the base URL.
pub const PATTERNS_PATH: &str = "/api/analysis/patterns";

/// Timeout applied to a pattern analysis request when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for talking to a remote analysis server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL of the server, e.g. `http://127.0.0.1:8080`.
    pub base_url: String,
    /// Maximum time to wait for a response.
    pub timeout: Duration,
}

impl ServiceConfig {
    /// Reads `ANALYSIS_ENDPOINT` and `ANALYSIS_TIMEOUT_SECS`.
    ///
    /// Returns `None` when no endpoint is configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("ANALYSIS_ENDPOINT").ok()?;
        let timeout = std::env::var("ANALYSIS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        Some(Self { base_url, timeout })
    }
}

/// A source of AI-generated patterns.
#[async_trait::async_trait]
pub trait PatternService: Send + Sync {
    /// Submits the request and returns the raw JSON response body.
    ///
    /// The body is not validated here; see
    /// [`crate::coerce::classify_response`].
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] on transport failure or a non-2xx status.
    async fn request_patterns(
        &self,
        request: &PatternAnalysisRequest,
    ) -> Result<serde_json::Value, AiError>;
}

/// [`PatternService`] backed by `POST /api/analysis/patterns`.
pub struct HttpPatternService {
    url: String,
    client: reqwest::Client,
}

impl HttpPatternService {
    /// Creates a client for the server at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ServiceConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            url: format!("{}{PATTERNS_PATH}", config.base_url.trim_end_matches('/')),
            client,
        })
    }

    /// The full endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl PatternService for HttpPatternService {
    async fn request_patterns(
        &self,
        request: &PatternAnalysisRequest,
    ) -> Result<serde_json::Value, AiError> {
        log::debug!(
            "Requesting AI patterns for {} incidents from {}",
            request.incidents.len(),
            self.url
        );

        let resp = self.client.post(&self.url).json(request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AiError::Status {
                status: status.as_u16(),
            });
        }

        let text = resp.text().await?;
        Ok(decode_body(&text))
    }
}

/// Parses a success body. A body that is not JSON decodes to `null`, which
/// classifies as a malformed response rather than a transport failure.
fn decode_body(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or_else(|e| {
        log::warn!("Analysis server returned a non-JSON body: {e}");
        serde_json::Value::Null
    })
}
