//! Provider identification and client construction options.

use serde::{Deserialize, Serialize};

/// Default number of retries for a failed chat call.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Options used by the factory to build a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Custom endpoint base URL
    pub endpoint: Option<String>,

    /// API key for hosted providers
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Request timeout in seconds; `None` waits indefinitely
    pub timeout_secs: Option<u64>,

    /// Groq reasoning output mode ("hidden", "raw", "parsed")
    pub reasoning_format: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_secs: None,
            reasoning_format: Some("hidden".to_string()),
        }
    }
}

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Groq,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "groq" => Some(Self::Groq),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::Ollama => "ollama",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("groq"), Some(ProviderType::Groq));
        assert_eq!(ProviderType::parse("Ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("openai"), None);
        assert_eq!(ProviderType::Groq.as_str(), "groq");
    }

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.max_retries, 2);
        assert_eq!(options.timeout_secs, None);
        assert_eq!(options.reasoning_format.as_deref(), Some("hidden"));
    }
}
