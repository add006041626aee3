#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! AI-assisted incident pattern analysis.
//!
//! Two sides of the same exchange live here. The client side
//! ([`analyzer`]) asks a remote analysis service for AI-generated patterns
//! and falls back to the rule-based detectors whenever the answer is
//! missing or unusable. The server side ([`agent`]) produces those answers
//! by prompting an LLM provider: Anthropic Claude, `OpenAI`, or any
//! `OpenAI`-compatible local server (Ollama, vLLM, llama.cpp, LM Studio)
//! selected through the `AI_BASE_URL` environment variable.

pub mod agent;
pub mod analyzer;
pub mod coerce;
pub mod providers;
pub mod service;

use thiserror::Error;

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The analysis service answered with a non-success status.
    #[error("Analysis service returned HTTP {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// The analysis service did not answer in time.
    #[error("Analysis service timed out after {seconds}s")]
    Timeout {
        /// The configured timeout.
        seconds: f64,
    },

    /// A newer analysis run started before this one finished.
    #[error("Analysis run {generation} was superseded by a newer run")]
    Superseded {
        /// The superseded run.
        generation: u64,
    },

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}
