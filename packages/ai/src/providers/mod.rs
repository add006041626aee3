//! LLM provider abstraction and implementations.
//!
//! Supports Anthropic Claude and any `OpenAI`-compatible chat completions
//! endpoint via a common trait.

pub mod anthropic;
pub mod openai;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::AiError;

/// Model used when `AI_MODEL` is unset and the provider is Anthropic.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Model used when `AI_MODEL` is unset and the provider is `OpenAI`.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Completion budget used when `AI_MAX_TOKENS` is unset.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// "user" or "assistant".
    pub role: String,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from the LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Text output, with multiple text blocks joined by newlines.
    pub text: String,
    /// Why the model stopped.
    pub stop_reason: StopReason,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Model finished its response naturally.
    EndTurn,
    /// Maximum tokens reached. The text is likely truncated.
    MaxTokens,
}

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends a single-turn completion request.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails.
    async fn chat(&self, system_prompt: &str, messages: &[Message])
    -> Result<LlmResponse, AiError>;
}

/// Supported provider backends, as named by `AI_PROVIDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ProviderKind {
    /// Anthropic Messages API.
    #[strum(to_string = "anthropic", serialize = "claude")]
    Anthropic,
    /// Hosted `OpenAI` chat completions.
    #[strum(to_string = "openai", serialize = "gpt")]
    OpenAi,
    /// Self-hosted `OpenAI`-compatible server at `AI_BASE_URL`.
    #[strum(to_string = "local")]
    Local,
}

/// Model and sampling settings shared by every provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// Model identifier.
    pub model: String,
    /// Completion token budget.
    pub max_tokens: u32,
    /// Sampling temperature. Pattern extraction runs at `0.0`.
    pub temperature: f32,
}

impl ProviderSettings {
    /// Reads `AI_MODEL` and `AI_MAX_TOKENS`, defaulting per provider.
    #[must_use]
    pub fn from_env(kind: ProviderKind) -> Self {
        let default_model = match kind {
            ProviderKind::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            ProviderKind::OpenAi | ProviderKind::Local => DEFAULT_OPENAI_MODEL,
        };
        Self {
            model: std::env::var("AI_MODEL").unwrap_or_else(|_| default_model.to_string()),
            max_tokens: std::env::var("AI_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: 0.0,
        }
    }
}

/// Creates an LLM provider based on environment variables.
///
/// `AI_PROVIDER` picks the backend explicitly. Without it the backend is
/// inferred from the first credential found: `ANTHROPIC_API_KEY`, then
/// `OPENAI_API_KEY`, then `AI_BASE_URL`.
///
/// Returns `Ok(None)` when nothing is configured, in which case callers
/// fall back to rule-based analysis.
///
/// # Errors
///
/// Returns [`AiError::Config`] if `AI_PROVIDER` names an unknown backend
/// or the chosen backend is missing its credentials.
pub fn create_provider_from_env() -> Result<Option<Box<dyn LlmProvider>>, AiError> {
    let kind = match std::env::var("AI_PROVIDER") {
        Ok(name) => name.parse::<ProviderKind>().map_err(|_| AiError::Config {
            message: format!("Unknown AI provider: {name}. Use 'anthropic', 'openai', or 'local'."),
        })?,
        Err(_) => {
            let Some(kind) = detect_provider() else {
                log::warn!(
                    "No AI credentials detected. Set ANTHROPIC_API_KEY, OPENAI_API_KEY, or \
                     AI_BASE_URL to enable AI pattern analysis. Rule-based analysis will be used."
                );
                return Ok(None);
            };
            kind
        }
    };

    let settings = ProviderSettings::from_env(kind);
    log::info!("Using {kind} provider with model {}", settings.model);

    let provider: Box<dyn LlmProvider> = match kind {
        ProviderKind::Anthropic => Box::new(anthropic::AnthropicProvider::new(
            required_env("ANTHROPIC_API_KEY")?,
            settings,
        )),
        ProviderKind::OpenAi => Box::new(openai::OpenAiProvider::new(
            Some(required_env("OPENAI_API_KEY")?),
            std::env::var("AI_BASE_URL").unwrap_or_else(|_| openai::DEFAULT_BASE_URL.to_string()),
            settings,
        )),
        ProviderKind::Local => Box::new(openai::OpenAiProvider::new(
            std::env::var("OPENAI_API_KEY").ok(),
            required_env("AI_BASE_URL")?,
            settings,
        )),
    };

    Ok(Some(provider))
}

fn required_env(name: &str) -> Result<String, AiError> {
    std::env::var(name).map_err(|_| AiError::Config {
        message: format!("{name} environment variable not set"),
    })
}

fn detect_provider() -> Option<ProviderKind> {
    let detected = [
        ("ANTHROPIC_API_KEY", ProviderKind::Anthropic),
        ("OPENAI_API_KEY", ProviderKind::OpenAi),
        ("AI_BASE_URL", ProviderKind::Local),
    ]
    .into_iter()
    .find(|(var, _)| std::env::var(var).is_ok());

    if let Some((var, kind)) = detected {
        log::info!("Auto-detected AI provider: {kind} ({var} found)");
    }
    detected.map(|(_, kind)| kind)
}

/// Posts `body` as JSON and returns the raw success body.
///
/// On a non-2xx status the provider's error message is extracted from the
/// body when possible, otherwise the status and body are reported verbatim.
async fn post_json(
    request: reqwest::RequestBuilder,
    body: &(impl Serialize + Sync),
) -> Result<String, AiError> {
    let resp = request.json(body).send().await?;
    let status = resp.status();
    let text = resp.text().await?;

    if status.is_success() {
        return Ok(text);
    }

    let message = envelope_message(&text).unwrap_or_else(|| format!("HTTP {status}: {text}"));
    log::warn!("LLM provider request failed: {message}");
    Err(AiError::Provider { message })
}

/// `{"error": {"message": ...}}`, the error shape shared by both APIs.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn envelope_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| e.error.message)
}
