//! Chunking pipeline orchestrator.

use super::{
    metadata::sha256_hex,
    splitters::{ChunkSplitter, RecursiveCharacterSplitter, SemanticSplitter},
    Chunk, ChunkMetadata, SplitterKind,
};
use crate::loader::LoadedDocument;
use askdoc_core::AppResult;
use chrono::Utc;

/// Configuration for the chunking pipeline.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Maximum characters shared by consecutive chunks
    pub chunk_overlap: usize,

    pub splitter: SplitterKind,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 70,
            splitter: SplitterKind::Recursive,
        }
    }
}

/// Splits every page of a document and attaches source metadata.
pub struct ChunkPipeline {
    splitter: Box<dyn ChunkSplitter>,
}

impl ChunkPipeline {
    /// Create a pipeline, rejecting invalid size/overlap combinations.
    pub fn new(config: ChunkConfig) -> AppResult<Self> {
        let splitter: Box<dyn ChunkSplitter> = match config.splitter {
            SplitterKind::Recursive => Box::new(RecursiveCharacterSplitter::new(
                config.chunk_size,
                config.chunk_overlap,
            )?),
            SplitterKind::Semantic => Box::new(SemanticSplitter::new(
                config.chunk_size,
                config.chunk_overlap,
            )?),
        };

        Ok(Self { splitter })
    }

    /// Chunk a document in page order, then position within the page.
    pub fn process(&self, document: &LoadedDocument) -> AppResult<Vec<Chunk>> {
        let source = document.source.display().to_string();
        let total_pages = document.pages.len();
        let created_at = Utc::now();
        let mut chunks = Vec::new();

        for page in &document.pages {
            let spans = self.splitter.split(&page.text)?;

            tracing::debug!(
                "Page {} of {}: {} chunks",
                page.label,
                document.file_name,
                spans.len()
            );

            for span in spans {
                let char_count = span.text.chars().count();
                let metadata = ChunkMetadata {
                    source: source.clone(),
                    file_name: document.file_name.clone(),
                    page: page.number,
                    page_label: page.label.clone(),
                    total_pages,
                    start_index: span.start,
                    char_count,
                    hash: sha256_hex(span.text.as_bytes()),
                    splitter: self.splitter.name().to_string(),
                    created_at,
                };

                chunks.push(Chunk {
                    id: uuid::Uuid::new_v4().to_string(),
                    text: span.text,
                    metadata,
                });
            }
        }

        tracing::info!(
            "Chunking complete: {} chunks from {} pages of {}",
            chunks.len(),
            total_pages,
            document.file_name
        );

        Ok(chunks)
    }
}
