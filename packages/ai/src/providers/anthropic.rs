//! Anthropic Messages API provider.

use serde::{Deserialize, Serialize};

use super::{LlmProvider, LlmResponse, Message, ProviderSettings, StopReason};
use crate::AiError;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Claude API provider.
pub struct AnthropicProvider {
    api_key: String,
    settings: ProviderSettings,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider.
    #[must_use]
    pub fn new(api_key: String, settings: ProviderSettings) -> Self {
        Self {
            api_key,
            settings,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<Block>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

fn parse_response(body: &str) -> Result<LlmResponse, AiError> {
    let response: MessagesResponse = serde_json::from_str(body)?;

    let text = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            Block::Text { text } => Some(text),
            Block::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    let stop_reason = if response.stop_reason.as_deref() == Some("max_tokens") {
        StopReason::MaxTokens
    } else {
        StopReason::EndTurn
    };

    Ok(LlmResponse { text, stop_reason })
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<LlmResponse, AiError> {
        let body = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            system: system_prompt,
            messages,
        };

        let request = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION);

        let text = super::post_json(request, &body).await?;
        parse_response(&text)
    }
}
