//! Ollama embedding provider.
//!
//! Calls `POST /api/embed`, which accepts a list of inputs and returns one
//! vector per input. The provider is lazy: nothing is sent until the first
//! embedding request, so `stats` and config commands work without a running
//! Ollama.

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use askdoc_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBED_ENDPOINT: &str = "/api/embed";

/// Retries after the first attempt
const MAX_RETRIES: u32 = 2;

const INITIAL_BACKOFF_MS: u64 = 200;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ollama embedding provider.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider. The endpoint comes from config, then `OLLAMA_URL`,
    /// then the local default.
    pub fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Embedding(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        let base_url = config
            .endpoint
            .clone()
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    #[instrument(skip(self, texts), fields(batch = texts.len(), model = %self.model))]
    async fn embed_with_retries(&self, texts: &[&str]) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 0;
        loop {
            match self.send_once(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err((true, err)) if attempt < MAX_RETRIES => {
                    attempt += 1;
                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
                    warn!(
                        "Embedding request failed (attempt {}), retrying in {}ms: {}",
                        attempt, backoff_ms, err
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err((_, err)) => return Err(err),
            }
        }
    }

    /// One HTTP round trip. The flag says whether the failure is retryable.
    async fn send_once(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, (bool, AppError)> {
        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);
        let request = EmbedRequest {
            model: &self.model,
            input: texts.to_vec(),
        };

        debug!("Sending embedding request to {}", url);

        let response = self.client.post(&url).json(&request).send().await.map_err(|e| {
            (
                true,
                AppError::Embedding(format!(
                    "Ollama not reachable at {} ({}). Ensure it is running and run: ollama pull {}",
                    self.base_url, e, self.model
                )),
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            return Err((
                retryable,
                AppError::Embedding(format!("Ollama API error ({}): {}", status, message)),
            ));
        }

        let body: EmbedResponse = response.json().await.map_err(|e| {
            (
                false,
                AppError::Embedding(format!("Failed to parse Ollama response: {}", e)),
            )
        })?;

        if body.embeddings.len() != texts.len() {
            return Err((
                false,
                AppError::Embedding(format!(
                    "Ollama returned {} embeddings for {} inputs",
                    body.embeddings.len(),
                    texts.len()
                )),
            ));
        }

        Ok(body.embeddings)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Ollama rejects empty input; those slots get a zero vector.
        let non_empty: Vec<(usize, &str)> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, t)| (i, t.as_str()))
            .collect();

        let mut embeddings = vec![vec![0.0; self.dimensions]; texts.len()];
        if non_empty.is_empty() {
            return Ok(embeddings);
        }

        let inputs: Vec<&str> = non_empty.iter().map(|(_, t)| *t).collect();
        let vectors = self.embed_with_retries(&inputs).await?;

        for ((index, _), vector) in non_empty.into_iter().zip(vectors) {
            embeddings[index] = vector;
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            endpoint: Some(endpoint.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_endpoint_from_config() {
        let provider = OllamaProvider::new(&config("http://gpu-box:11434/")).unwrap();
        assert_eq!(provider.base_url, "http://gpu-box:11434");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_request_body() {
        let request = EmbedRequest {
            model: "all-minilm",
            input: vec!["first", "second"],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "all-minilm");
        assert_eq!(json["input"][1], "second");
    }

    #[test]
    fn test_parse_response() {
        let raw = r#"{"model":"all-minilm","embeddings":[[0.1,0.2],[0.3,0.4]]}"#;
        let parsed: EmbedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[1], vec![0.3, 0.4]);
    }

    #[tokio::test]
    async fn test_blank_inputs_skip_the_network() {
        let provider = OllamaProvider::new(&config("http://127.0.0.1:1")).unwrap();
        let embeddings = provider
            .embed_batch(&["".to_string(), "  ".to_string()])
            .await
            .unwrap();
        assert_eq!(embeddings.len(), 2);
        assert!(embeddings.iter().all(|e| e.len() == 384 && e.iter().all(|x| *x == 0.0)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_error() {
        let provider = OllamaProvider::new(&config("http://127.0.0.1:1")).unwrap();
        let result = provider.embed("hello").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }
}
