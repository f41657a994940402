//! In-memory vector store.

use super::{dedupe_by_id, squared_l2, QueryHit, StoredRecord, VectorStore};
use askdoc_core::AppResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A `HashMap` of records behind a `tokio::sync::RwLock`, searched by brute
/// force with the same metric as LanceDB.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&self, records: &[StoredRecord]) -> AppResult<()> {
        let mut store = self.records.write().await;
        for record in dedupe_by_id(records.to_vec()) {
            store.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> AppResult<Vec<QueryHit>> {
        let store = self.records.read().await;

        let mut hits: Vec<QueryHit> = store
            .values()
            .map(|record| QueryHit {
                id: record.id.clone(),
                text: record.text.clone(),
                metadata: record.metadata.clone(),
                distance: squared_l2(&record.embedding, embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.records.read().await.len())
    }

    async fn reset(&self) -> AppResult<()> {
        self.records.write().await.clear();
        Ok(())
    }
}
