//! Chat-completion client
//!
//! `ChatClient` is the seam between the harness and the model API; the
//! runner and judge only talk to the trait so tests can script responses.
//! `OpenAiClient` is the real implementation against any OpenAI-compatible
//! `/chat/completions` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::messages::{ChatMessage, ChatResponse, TokenUsage};
use crate::config::ModelSettings;
use crate::error::{RubricError, RubricResult};

/// A client capable of one chat-completion round trip
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send the messages and return the model's reply
    async fn chat(
        &self,
        messages: &[ChatMessage],
        settings: &ModelSettings,
    ) -> RubricResult<ChatResponse>;
}

/// Client for OpenAI-compatible chat-completion endpoints
pub struct OpenAiClient {
    api_key: String,
    http_client: Client,
}

impl OpenAiClient {
    /// Create a new client with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http_client: Client::new(),
        }
    }

    /// Create a client reusing an existing HTTP client
    pub fn with_http_client(api_key: impl Into<String>, http_client: Client) -> Self {
        Self {
            api_key: api_key.into(),
            http_client,
        }
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        settings: &ModelSettings,
    ) -> RubricResult<ChatResponse> {
        let url = format!("{}/chat/completions", settings.base_url.trim_end_matches('/'));

        let mut request_body = json!({
            "model": settings.model,
            "messages": messages,
            "temperature": settings.temperature,
        });
        if let Some(max_tokens) = settings.max_tokens {
            request_body["max_tokens"] = json!(max_tokens);
        }

        tracing::debug!(model = %settings.model, url = %url, "sending chat completion request");

        let response = self
            .http_client
            .post(&url)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                RubricError::generation_with_model(
                    format!("request failed: {}", e),
                    settings.model.clone(),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RubricError::generation_with_model(
                format!("API error (status {}): {}", status, error_text),
                settings.model.clone(),
            ));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            RubricError::generation_with_model(
                format!("failed to parse response body: {}", e),
                settings.model.clone(),
            )
        })?;

        parse_chat_completion(&response_json)
    }
}

/// Extract content, usage and finish reason from a chat-completion payload
fn parse_chat_completion(payload: &Value) -> RubricResult<ChatResponse> {
    let choice = payload["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .ok_or_else(|| RubricError::generation("response has no choices"))?;

    let content = choice["message"]["content"]
        .as_str()
        .ok_or_else(|| RubricError::generation("response choice has no message content"))?
        .to_string();

    let usage = payload
        .get("usage")
        .and_then(|u| serde_json::from_value::<TokenUsage>(u.clone()).ok());

    Ok(ChatResponse {
        content,
        model: payload["model"].as_str().map(String::from),
        usage,
        finish_reason: choice["finish_reason"].as_str().map(String::from),
    })
}
