//! Query-time retrieval and scoring.

use super::types::RetrievedDocument;
use crate::embeddings::Embedder;
use crate::store::{QueryHit, VectorStore};
use askdoc_core::AppResult;
use std::sync::Arc;

/// Similarity score for a store distance: `1 / (1 + distance)`.
pub fn score(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Score hits in store order and drop those below `score_threshold`.
///
/// Ranks are positions in the store result, assigned before filtering, so
/// a dropped hit leaves a gap rather than renumbering the rest.
pub fn score_hits(hits: Vec<QueryHit>, score_threshold: f32) -> Vec<RetrievedDocument> {
    hits.into_iter()
        .enumerate()
        .map(|(i, hit)| RetrievedDocument {
            score: score(hit.distance),
            rank: i + 1,
            id: hit.id,
            text: hit.text,
            metadata: hit.metadata,
            distance: hit.distance,
        })
        .filter(|doc| doc.score >= score_threshold)
        .collect()
}

/// Embeds queries and turns store results into scored documents.
#[derive(Clone)]
pub struct Retriever {
    embedder: Embedder,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Embedder, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Retrieve up to `top_k` documents scoring at least `score_threshold`.
    ///
    /// Returns `None` when the store has no match, and also when embedding
    /// or the store query fails; failures are logged at error level.
    /// `Some(vec![])` means matches existed but none passed the threshold.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        score_threshold: f32,
    ) -> Option<Vec<RetrievedDocument>> {
        match self.try_retrieve(query, top_k, score_threshold).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!("Error retrieving documents from vector store: {}", e);
                None
            }
        }
    }

    async fn try_retrieve(
        &self,
        query: &str,
        top_k: usize,
        score_threshold: f32,
    ) -> AppResult<Option<Vec<RetrievedDocument>>> {
        let vector = self.embedder.embed_query(query).await?;
        let hits = self.store.query(&vector, top_k).await?;

        if hits.is_empty() {
            tracing::info!("Vector store returned no documents");
            return Ok(None);
        }

        let candidates = hits.len();
        let documents = score_hits(hits, score_threshold);

        match documents.first() {
            Some(top) => tracing::info!(
                "Retrieved {} of {} candidates (top score: {:.3})",
                documents.len(),
                candidates,
                top.score
            ),
            None => tracing::info!(
                "All {} candidates scored below {:.2}",
                candidates,
                score_threshold
            ),
        }

        Ok(Some(documents))
    }
}
