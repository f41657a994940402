//! Page-aware chunking.
//!
//! Each page of a loaded document is split independently, so every chunk
//! carries a single page reference for citations.

pub(crate) mod metadata;
mod pipeline;
pub mod splitters;

pub use pipeline::{ChunkConfig, ChunkPipeline};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Splitting strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitterKind {
    /// Paragraph, line, word, then character separators
    #[default]
    Recursive,

    /// `text-splitter` semantic levels
    Semantic,
}

impl SplitterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recursive => "recursive",
            Self::Semantic => "semantic",
        }
    }
}

/// A chunk of document text with its origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier (UUID v4), reused as the stored record id
    pub id: String,

    /// Chunk text content
    pub text: String,

    pub metadata: ChunkMetadata,
}

/// Where a chunk came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source path as given at ingestion
    pub source: String,

    pub file_name: String,

    /// 0-based page index
    pub page: usize,

    /// 1-based page label
    pub page_label: String,

    pub total_pages: usize,

    /// Character offset of the chunk inside its page
    pub start_index: usize,

    pub char_count: usize,

    /// SHA-256 of the chunk text
    pub hash: String,

    /// Splitter that produced the chunk
    pub splitter: String,

    pub created_at: DateTime<Utc>,
}

impl ChunkMetadata {
    /// Human-readable location, e.g. "resume.pdf, page 2".
    pub fn location(&self) -> String {
        format!("{}, page {}", self.file_name, self.page_label)
    }
}
