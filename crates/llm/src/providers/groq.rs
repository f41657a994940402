//! Groq chat provider.
//!
//! Groq exposes an OpenAI-compatible chat completions API.
//! Reasoning models (e.g. qwen3) accept a `reasoning_format` field; "hidden"
//! keeps the thinking trace out of the returned content.

use super::{backoff, build_http_client, is_retryable_status};
use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::types::ClientOptions;
use askdoc_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default Groq API base URL.
pub const DEFAULT_GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_format: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: LlmUsage,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Groq chat client.
pub struct GroqClient {
    base_url: String,
    api_key: String,
    max_retries: u32,
    reasoning_format: Option<String>,
    client: reqwest::Client,
}

impl GroqClient {
    /// Create a client with the given API key and factory options.
    pub fn new(api_key: impl Into<String>, options: &ClientOptions) -> AppResult<Self> {
        let base_url = options
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_GROQ_ENDPOINT.to_string());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_retries: options.max_retries,
            reasoning_format: options.reasoning_format.clone(),
            client: build_http_client(options.timeout_secs)?,
        })
    }

    fn to_chat_request(&self, request: &LlmRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ChatRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            reasoning_format: self.reasoning_format.clone(),
        }
    }

    /// Perform one HTTP round trip. The flag on error marks it retryable.
    async fn send_once(&self, body: &ChatRequest) -> Result<LlmResponse, (bool, AppError)> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                (
                    true,
                    AppError::Llm(format!("Failed to send request to Groq: {}", e)),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            return Err((
                is_retryable_status(status),
                AppError::Llm(format!("Groq API error ({}): {}", status, message)),
            ));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            (
                false,
                AppError::Llm(format!("Failed to parse Groq response: {}", e)),
            )
        })?;

        convert_response(parsed).map_err(|e| (false, e))
    }
}

fn convert_response(response: ChatResponse) -> AppResult<LlmResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Llm("Groq response contained no choices".to_string()))?;

    Ok(LlmResponse {
        content: choice.message.content,
        model: response.model,
        usage: response.usage,
    })
}

#[async_trait::async_trait]
impl LlmClient for GroqClient {
    fn provider_name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to Groq ({})", request.model);
        let body = self.to_chat_request(request);

        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(response) => {
                    tracing::debug!(
                        "Groq completion: {} prompt + {} completion tokens",
                        response.usage.prompt_tokens,
                        response.usage.completion_tokens
                    );
                    return Ok(response);
                }
                Err((true, err)) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!("Groq call failed (attempt {}): {}", attempt, err);
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err((_, err)) => return Err(err),
            }
        }
    }
}
