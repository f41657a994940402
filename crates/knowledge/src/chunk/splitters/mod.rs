//! Splitter implementations.

mod recursive;
mod semantic;

pub use recursive::{RecursiveCharacterSplitter, DEFAULT_SEPARATORS};
pub use semantic::SemanticSplitter;

use askdoc_core::AppResult;

/// A piece of split text and where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    /// Character offset inside the split text
    pub start: usize,
    pub text: String,
}

/// Trait for text splitters.
pub trait ChunkSplitter: Send + Sync {
    /// Name recorded in chunk metadata.
    fn name(&self) -> &'static str;

    /// Split text into trimmed, non-empty spans in document order.
    fn split(&self, text: &str) -> AppResult<Vec<TextSpan>>;
}
