//! Retrieval-augmented answering.
//!
//! [`Retriever`] finds scored chunks, [`AnswerGenerator`] turns them into an
//! answer, and [`QaPipeline`] runs one after the other.

pub mod citations;
pub mod generator;
pub mod retriever;
pub mod types;

pub use citations::{CitationRef, MAX_SNIPPET_CHARS};
pub use generator::{format_context, AnswerGenerator};
pub use retriever::{score, Retriever};
pub use types::{Answer, RetrievedDocument};

use crate::config::RetrievalConfig;

/// Retrieve, then generate.
pub struct QaPipeline {
    retriever: Retriever,
    generator: AnswerGenerator,
    top_k: usize,
    score_threshold: f32,
}

impl QaPipeline {
    pub fn new(retriever: Retriever, generator: AnswerGenerator, retrieval: &RetrievalConfig) -> Self {
        Self {
            retriever,
            generator,
            top_k: retrieval.top_k,
            score_threshold: retrieval.score_threshold,
        }
    }

    /// Answer a query. A failed or empty retrieval becomes empty context,
    /// so the model says it does not know. `None` means generation failed.
    pub async fn ask(&self, query: &str) -> Option<Answer> {
        let documents = self
            .retriever
            .retrieve(query, self.top_k, self.score_threshold)
            .await
            .unwrap_or_default();

        if documents.is_empty() {
            tracing::warn!("No documents retrieved for query; answering without context");
        }

        self.generator.generate(query, &documents).await
    }
}
