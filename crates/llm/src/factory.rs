//! Chat provider factory.
//!
//! Builds a client from a provider name and resolved options.

use crate::client::LlmClient;
use crate::providers::{GroqClient, OllamaClient};
use crate::types::{ClientOptions, ProviderType};
use askdoc_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a chat client based on the provider name.
///
/// # Errors
/// Returns error if:
/// - Provider is unknown
/// - A hosted provider has no API key
/// - The HTTP client cannot be built
pub fn create_client(provider: &str, options: &ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    tracing::debug!(
        "Creating {} client (endpoint: {:?}, max_retries: {}, timeout: {:?})",
        provider_type.as_str(),
        options.endpoint,
        options.max_retries,
        options.timeout_secs
    );

    match provider_type {
        ProviderType::Groq => {
            let api_key = options
                .api_key
                .as_deref()
                .ok_or_else(|| AppError::Config("Groq provider requires API key".to_string()))?;
            Ok(Arc::new(GroqClient::new(api_key, options)?))
        }
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::new(options)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", &ClientOptions::default()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_groq_client_with_key() {
        let options = ClientOptions {
            api_key: Some("gsk_test".to_string()),
            ..ClientOptions::default()
        };
        let client = create_client("groq", &options).unwrap();
        assert_eq!(client.provider_name(), "groq");
    }

    #[test]
    fn test_groq_requires_api_key() {
        match create_client("groq", &ClientOptions::default()) {
            Err(err) => assert!(err.to_string().contains("requires API key")),
            Ok(_) => panic!("Expected error for Groq without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", &ClientOptions::default()) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
