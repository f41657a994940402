//! Semantic splitter backed by the `text-splitter` crate.

use super::{ChunkSplitter, TextSpan};
use askdoc_core::{AppError, AppResult};
use text_splitter::{ChunkConfig as SplitterConfig, TextSplitter as ExternalTextSplitter};

/// Splits on the highest semantic level (sentences, words, graphemes) that
/// keeps each chunk within `chunk_size` characters.
pub struct SemanticSplitter {
    inner: ExternalTextSplitter<text_splitter::Characters>,
}

impl SemanticSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be greater than 0".to_string()));
        }

        let config = SplitterConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| AppError::Config(format!("Invalid chunk overlap: {}", e)))?;

        Ok(Self {
            inner: ExternalTextSplitter::new(config),
        })
    }
}

impl ChunkSplitter for SemanticSplitter {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn split(&self, text: &str) -> AppResult<Vec<TextSpan>> {
        let mut spans = Vec::new();
        let mut char_offset = 0;
        let mut byte_cursor = 0;

        for (byte_offset, chunk) in self.inner.chunk_indices(text) {
            if chunk.trim().is_empty() {
                continue;
            }

            // Offsets can move backwards when chunks overlap.
            if byte_offset >= byte_cursor {
                char_offset += text[byte_cursor..byte_offset].chars().count();
            } else {
                char_offset -= text[byte_offset..byte_cursor].chars().count();
            }
            byte_cursor = byte_offset;

            spans.push(TextSpan {
                start: char_offset,
                text: chunk.to_string(),
            });
        }

        tracing::debug!(
            "Semantic splitter created {} chunks from {} bytes",
            spans.len(),
            text.len()
        );

        Ok(spans)
    }
}
