//! `OpenAI`-compatible chat completions provider.
//!
//! Works against the hosted `OpenAI` API as well as self-hosted servers
//! that expose the same endpoint (Ollama, vLLM, llama.cpp, LM Studio).

use serde::{Deserialize, Serialize};

use super::{LlmProvider, LlmResponse, Message, ProviderSettings, StopReason};
use crate::AiError;

/// Base URL of the hosted `OpenAI` API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// `OpenAI`-compatible API provider.
pub struct OpenAiProvider {
    api_key: Option<String>,
    completions_url: String,
    settings: ProviderSettings,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a new provider. `api_key` may be `None` for local servers
    /// that do not require authentication.
    #[must_use]
    pub fn new(api_key: Option<String>, base_url: String, settings: ProviderSettings) -> Self {
        Self {
            api_key,
            completions_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            settings,
            client: reqwest::Client::new(),
        }
    }

    /// Full URL requests are sent to.
    #[must_use]
    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }
}

/// The system prompt travels as the first message.
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn parse_response(body: &str) -> Result<LlmResponse, AiError> {
    let response: CompletionResponse = serde_json::from_str(body)?;

    let Some(choice) = response.choices.into_iter().next() else {
        return Err(AiError::Provider {
            message: "Completion response contained no choices".to_string(),
        });
    };

    let stop_reason = if choice.finish_reason.as_deref() == Some("length") {
        StopReason::MaxTokens
    } else {
        StopReason::EndTurn
    };

    Ok(LlmResponse {
        text: choice.message.content.unwrap_or_default(),
        stop_reason,
    })
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<LlmResponse, AiError> {
        let messages = std::iter::once(ChatMessage {
            role: "system",
            content: system_prompt,
        })
        .chain(messages.iter().map(|m| ChatMessage {
            role: &m.role,
            content: &m.content,
        }))
        .collect();

        let body = CompletionRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages,
        };

        let mut request = self.client.post(&self.completions_url);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let text = super::post_json(request, &body).await?;
        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ProviderSettings {
        ProviderSettings {
            model: "llama3".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
        }
    }

    #[test]
    fn builds_completions_url() {
        let provider = OpenAiProvider::new(None, "http://localhost:11434/v1/".to_string(), settings());
        assert_eq!(
            provider.completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn takes_first_choice() {
        let body = r#"{"choices": [
            {"message": {"content": "{\"spatial\": []}"}, "finish_reason": "length"},
            {"message": {"content": "ignored"}, "finish_reason": "stop"}
        ]}"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.text, "{\"spatial\": []}");
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
    }

    #[test]
    fn missing_choices_is_an_error() {
        assert!(matches!(
            parse_response(r#"{"choices": []}"#),
            Err(AiError::Provider { .. })
        ));
        assert!(matches!(parse_response("not json"), Err(AiError::Json(_))));
    }

    #[test]
    fn null_content_is_empty_text() {
        let body = r#"{"choices": [{"message": {"content": null}, "finish_reason": "stop"}]}"#;
        assert_eq!(parse_response(body).unwrap().text, "");
    }
}
