//! Prompt system for askdoc.
//!
//! - Built-in answer prompts (`rag.answer`, `rag.answer.cited`)
//! - YAML overrides under `.askdoc/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

pub use builder::build_prompt;
pub use loader::{builtin_prompt, list_prompts, load_prompt, RAG_ANSWER, RAG_ANSWER_CITED};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
