//! Ollama chat provider.
//!
//! Runs answer generation against a local Ollama runtime.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use super::{backoff, build_http_client, is_retryable_status};
use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::types::ClientOptions;
use askdoc_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default local Ollama endpoint.
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    options: GenerateOptions,
    stream: bool,
}

#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    model: String,
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama chat client.
pub struct OllamaClient {
    base_url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client from factory options.
    pub fn new(options: &ClientOptions) -> AppResult<Self> {
        let base_url = options
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_ENDPOINT.to_string());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: options.max_retries,
            client: build_http_client(options.timeout_secs)?,
        })
    }

    fn to_generate_request(&self, request: &LlmRequest) -> GenerateRequest {
        GenerateRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
            stream: false,
        }
    }

    async fn send_once(&self, body: &GenerateRequest) -> Result<LlmResponse, (bool, AppError)> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            (
                true,
                AppError::Llm(format!("Failed to send request to Ollama: {}", e)),
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err((
                is_retryable_status(status),
                AppError::Llm(format!("Ollama API error ({}): {}", status, error_text)),
            ));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            (
                false,
                AppError::Llm(format!("Failed to parse Ollama response: {}", e)),
            )
        })?;

        Ok(LlmResponse {
            content: parsed.response,
            model: parsed.model,
            usage: LlmUsage::new(
                parsed.prompt_eval_count.unwrap_or(0),
                parsed.eval_count.unwrap_or(0),
            ),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to Ollama ({})", request.model);
        let body = self.to_generate_request(request);

        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(response) => {
                    tracing::debug!(
                        "Ollama completion: {} tokens",
                        response.usage.total_tokens
                    );
                    return Ok(response);
                }
                Err((true, err)) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!("Ollama call failed (attempt {}): {}", attempt, err);
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err((_, err)) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let client = OllamaClient::new(&ClientOptions::default()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url, DEFAULT_OLLAMA_ENDPOINT);
    }

    #[test]
    fn test_custom_endpoint_trailing_slash() {
        let options = ClientOptions {
            endpoint: Some("http://gpu-box:11434/".to_string()),
            ..ClientOptions::default()
        };
        let client = OllamaClient::new(&options).unwrap();
        assert_eq!(client.base_url, "http://gpu-box:11434");
    }

    #[test]
    fn test_generate_request_conversion() {
        let client = OllamaClient::new(&ClientOptions::default()).unwrap();
        let request = LlmRequest::new("Hello", "llama3.2")
            .with_system("Be brief.")
            .with_temperature(0.0)
            .with_max_tokens(100);

        let body = client.to_generate_request(&request);
        assert_eq!(body.model, "llama3.2");
        assert!(!body.stream);

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["options"]["num_predict"], 100);
        assert_eq!(json["options"]["temperature"], 0.0);
        assert_eq!(json["system"], "Be brief.");
    }

    #[test]
    fn test_parse_generate_response() {
        let raw = r#"{"model":"llama3.2","response":"Paris.","done":true,"prompt_eval_count":12,"eval_count":3}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.response, "Paris.");
        assert_eq!(parsed.eval_count, Some(3));
    }
}
