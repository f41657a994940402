//! Vector storage.
//!
//! Records are `(id, text, embedding, metadata)` tuples. Both backends rank
//! by squared Euclidean distance, ascending.

mod lance;
mod memory;

pub use lance::LanceDbStore;
pub use memory::MemoryStore;

use askdoc_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A record as written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: serde_json::Value,
}

impl StoredRecord {
    /// Zip parallel sequences into records.
    ///
    /// The four sequences must have equal length. Duplicate ids keep the
    /// last occurrence, at the position of the first.
    pub fn zip(
        ids: Vec<String>,
        texts: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        metadatas: Vec<serde_json::Value>,
    ) -> AppResult<Vec<Self>> {
        let n = ids.len();
        if texts.len() != n || embeddings.len() != n || metadatas.len() != n {
            return Err(AppError::Store(format!(
                "Length mismatch: {} ids, {} texts, {} embeddings, {} metadatas",
                n,
                texts.len(),
                embeddings.len(),
                metadatas.len()
            )));
        }

        let records = ids
            .into_iter()
            .zip(texts)
            .zip(embeddings)
            .zip(metadatas)
            .map(|(((id, text), embedding), metadata)| Self {
                id,
                text,
                embedding,
                metadata,
            })
            .collect();

        Ok(dedupe_by_id(records))
    }
}

/// Keep the last record for each id.
pub(crate) fn dedupe_by_id(records: Vec<StoredRecord>) -> Vec<StoredRecord> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<StoredRecord> = Vec::with_capacity(records.len());

    for record in records {
        match positions.get(&record.id) {
            Some(&index) => unique[index] = record,
            None => {
                positions.insert(record.id.clone(), unique.len());
                unique.push(record);
            }
        }
    }

    unique
}

/// A nearest-neighbour result.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    pub id: String,
    pub text: String,
    pub metadata: serde_json::Value,

    /// Squared Euclidean distance to the query
    pub distance: f32,
}

/// Trait for vector store backends.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Insert or replace records by id.
    async fn upsert(&self, records: &[StoredRecord]) -> AppResult<()>;

    /// Nearest neighbours of `embedding`, closest first.
    async fn query(&self, embedding: &[f32], top_k: usize) -> AppResult<Vec<QueryHit>>;

    async fn count(&self) -> AppResult<usize>;

    /// Remove every record.
    async fn reset(&self) -> AppResult<()>;
}

/// Store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// On-disk LanceDB table
    #[default]
    #[serde(rename = "lancedb")]
    LanceDb,

    /// Process-local map, lost on exit
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LanceDb => "lancedb",
            Self::Memory => "memory",
        }
    }
}

/// Store settings, under `store:` in `knowledge.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// LanceDB table name
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    "documents".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            table: default_table(),
        }
    }
}

/// What to do with a persisted index built for another embedding width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Fail and leave it untouched
    Query,

    /// Drop and recreate it; only ingestion, which rewrites the index, uses this
    Rebuild,
}

/// Open the configured store. `index_path` is only used by LanceDB.
pub async fn open_store(
    config: &StoreConfig,
    index_path: &Path,
    dimensions: usize,
    mode: OpenMode,
) -> AppResult<Arc<dyn VectorStore>> {
    match config.backend {
        StoreBackend::LanceDb => Ok(Arc::new(
            LanceDbStore::open(index_path, &config.table, dimensions, mode).await?,
        )),
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

/// Squared Euclidean distance, LanceDB's default `l2` metric.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
