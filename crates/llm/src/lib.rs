//! Chat model integration for askdoc.
//!
//! A provider-agnostic [`LlmClient`] trait with two implementations:
//! - **Groq**: hosted OpenAI-compatible API (default)
//! - **Ollama**: local runtime
//!
//! # Example
//! ```no_run
//! use askdoc_llm::{create_client, ClientOptions, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ClientOptions {
//!     api_key: std::env::var("GROQ_API_KEY").ok(),
//!     ..ClientOptions::default()
//! };
//! let client = create_client("groq", &options)?;
//! let request = LlmRequest::new("Hello", "qwen/qwen3-32b").with_temperature(0.0);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GroqClient, OllamaClient};
pub use types::{ClientOptions, ProviderType, DEFAULT_MAX_RETRIES};
