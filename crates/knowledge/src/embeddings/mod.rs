//! Embedding engine.
//!
//! Wraps a provider with batching and dimension checks so every vector that
//! reaches the store has the configured length.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use crate::progress::ProgressReporter;
use askdoc_core::{AppError, AppResult};
use std::sync::Arc;

/// Batched, dimension-checked embedding.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    dimensions: usize,
    batch_size: usize,
}

impl Embedder {
    /// Build an embedder from configuration.
    pub fn from_config(config: &EmbeddingConfig) -> AppResult<Self> {
        let provider = create_provider(config)?;
        Ok(Self::new(provider, config.dimensions, config.batch_size))
    }

    /// Wrap an existing provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, dimensions: usize, batch_size: usize) -> Self {
        Self {
            provider,
            dimensions,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed texts in configured batches, preserving order.
    pub async fn embed_texts(
        &self,
        texts: &[String],
        progress: &ProgressReporter,
    ) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(
            "Embedding {} texts using provider '{}' (model: {})",
            texts.len(),
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let total = texts.len() as u64;
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let vectors = self.provider.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "Provider returned {} vectors for a batch of {}",
                    vectors.len(),
                    batch.len()
                )));
            }

            for vector in &vectors {
                self.check_dimensions(vector)?;
            }

            embeddings.extend(vectors);
            progress.embed(embeddings.len() as u64, total, self.provider.model_name());
        }

        tracing::debug!(
            "Generated {} embeddings of dimension {}",
            embeddings.len(),
            self.dimensions
        );

        Ok(embeddings)
    }

    /// Embed a single query.
    pub async fn embed_query(&self, query: &str) -> AppResult<Vec<f32>> {
        let vector = self.provider.embed(query).await?;
        self.check_dimensions(&vector)?;
        Ok(vector)
    }

    fn check_dimensions(&self, vector: &[f32]) -> AppResult<()> {
        if vector.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Model '{}' returned {} dimensions, expected {}",
                self.provider.model_name(),
                vector.len(),
                self.dimensions
            )));
        }
        Ok(())
    }
}
