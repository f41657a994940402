//! Single-document knowledge base.
//!
//! Loads a document, splits it into page-aware chunks, embeds them and
//! stores the vectors; at query time retrieves scored chunks and grounds a
//! chat model answer in them.

pub mod chunk;
pub mod config;
pub mod embeddings;
pub mod loader;
pub mod manifest;
pub mod progress;
pub mod rag;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use chunk::{Chunk, ChunkConfig, ChunkMetadata, ChunkPipeline, SplitterKind};
pub use config::{KnowledgeConfig, RetrievalConfig};
pub use embeddings::{Embedder, EmbeddingConfig};
pub use loader::{load_document, LoadedDocument};
pub use manifest::IngestManifest;
pub use progress::{ProgressEvent, ProgressReporter};
pub use rag::{Answer, AnswerGenerator, CitationRef, QaPipeline, RetrievedDocument, Retriever};
pub use store::{OpenMode, StoreBackend, StoreConfig, StoredRecord, VectorStore};
pub use types::{IngestStats, KnowledgeStats};

use askdoc_core::{AppError, AppResult};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Rows per upsert call.
const UPSERT_BATCH: usize = 256;

/// An opened knowledge base: configuration, embedder and vector store.
pub struct KnowledgeBase {
    workspace: PathBuf,
    config: KnowledgeConfig,
    embedder: Embedder,
    store: Arc<dyn VectorStore>,
}

impl KnowledgeBase {
    /// Open the store for querying. An index built for another embedding
    /// width is an error and is left as is.
    pub async fn open(workspace: &Path, config: KnowledgeConfig) -> AppResult<Self> {
        Self::open_with(workspace, config, OpenMode::Query).await
    }

    /// Open the store to rebuild it with [`KnowledgeBase::ingest`]. An index
    /// built for another embedding width is dropped.
    pub async fn open_for_ingest(workspace: &Path, config: KnowledgeConfig) -> AppResult<Self> {
        Self::open_with(workspace, config, OpenMode::Rebuild).await
    }

    async fn open_with(
        workspace: &Path,
        config: KnowledgeConfig,
        mode: OpenMode,
    ) -> AppResult<Self> {
        config.validate()?;

        let embedder = Embedder::from_config(&config.embedding)?;
        let store = store::open_store(
            &config.store,
            &config::get_index_path(workspace),
            config.embedding.dimensions,
            mode,
        )
        .await?;

        tracing::debug!(
            "Opened knowledge base at {:?} ({} store, {} embeddings)",
            workspace,
            store.backend_name(),
            config.embedding.provider
        );

        Ok(Self {
            workspace: workspace.to_path_buf(),
            config,
            embedder,
            store,
        })
    }

    /// Replace the index with the contents of one document.
    ///
    /// load, chunk, embed, reset, upsert, then write the manifest and the
    /// effective config.
    pub async fn ingest(&self, path: &Path, progress: &ProgressReporter) -> AppResult<IngestStats> {
        let start = Instant::now();
        tracing::info!("Ingesting {:?}", path);

        let document = load_document(path)?;
        progress.load(document.pages.len() as u64, &document.file_name);

        let pipeline = ChunkPipeline::new(ChunkConfig {
            chunk_size: self.config.chunk_size,
            chunk_overlap: self.config.chunk_overlap,
            splitter: self.config.splitter,
        })?;
        let chunks = pipeline.process(&document)?;
        progress.chunk(chunks.len() as u64, document.pages.len() as u64);

        if chunks.is_empty() {
            return Err(AppError::Document(format!(
                "No text could be extracted from {:?}",
                path
            )));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_texts(&texts, progress).await?;

        let metadatas = chunks
            .iter()
            .map(|c| serde_json::to_value(&c.metadata))
            .collect::<Result<Vec<_>, _>>()?;
        let ids = chunks.iter().map(|c| c.id.clone()).collect();
        let records = StoredRecord::zip(ids, texts, embeddings, metadatas)?;

        self.store.reset().await?;
        let total = records.len() as u64;
        let mut written = 0u64;
        for batch in records.chunks(UPSERT_BATCH) {
            self.store.upsert(batch).await?;
            written += batch.len() as u64;
            progress.index(written, total, self.store.backend_name());
        }

        let manifest = IngestManifest {
            source: document.source.display().to_string(),
            file_name: document.file_name.clone(),
            sha256: document.sha256.clone(),
            bytes: document.bytes,
            pages: document.pages.len(),
            chunks: chunks.len(),
            splitter: self.config.splitter.as_str().to_string(),
            chunk_size: self.config.chunk_size,
            chunk_overlap: self.config.chunk_overlap,
            embedding: self.config.embedding.clone(),
            ingested_at: Utc::now(),
        };
        manifest.save(&self.workspace)?;
        config::save_config(&self.workspace, &self.config)?;

        let duration = start.elapsed();
        tracing::info!(
            "Ingestion completed: {} pages, {} chunks, {} bytes in {:.2}s",
            document.pages.len(),
            chunks.len(),
            document.bytes,
            duration.as_secs_f64()
        );

        Ok(IngestStats {
            pages: document.pages.len(),
            chunks: chunks.len(),
            bytes: document.bytes,
            duration_secs: duration.as_secs_f64(),
        })
    }

    /// Check that the index was built with the configured embedding setup.
    pub fn check_manifest(&self) -> AppResult<Option<IngestManifest>> {
        let manifest = IngestManifest::load(&self.workspace)?;
        if let Some(manifest) = &manifest {
            manifest
                .embedding
                .validate_consistency(&self.config.embedding)
                .map_err(|e| {
                    AppError::Config(format!("{}. Re-run `askdoc ingest` to rebuild the index", e))
                })?;
        }
        Ok(manifest)
    }

    pub fn retriever(&self) -> Retriever {
        Retriever::new(self.embedder.clone(), Arc::clone(&self.store))
    }

    /// `retrieval` replaces the configured settings for this pipeline only.
    pub fn qa_pipeline(
        &self,
        generator: AnswerGenerator,
        retrieval: &RetrievalConfig,
    ) -> QaPipeline {
        QaPipeline::new(self.retriever(), generator, retrieval)
    }

    pub async fn stats(&self) -> AppResult<KnowledgeStats> {
        Ok(KnowledgeStats {
            records: self.store.count().await?,
            backend: self.store.backend_name().to_string(),
            index_path: config::get_index_path(&self.workspace),
            manifest: IngestManifest::load(&self.workspace)?,
            prompts: askdoc_prompt::list_prompts(&self.workspace)?,
        })
    }
}
