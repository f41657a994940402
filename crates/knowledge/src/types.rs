//! Ingestion and index statistics.

use crate::manifest::IngestManifest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    pub pages: usize,
    pub chunks: usize,
    pub bytes: u64,
    pub duration_secs: f64,
}

/// Current state of the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStats {
    /// Records in the vector store
    pub records: usize,
    pub backend: String,
    pub index_path: PathBuf,

    /// Absent until the first ingestion
    pub manifest: Option<IngestManifest>,

    /// Prompt ids in effect, built-ins and overrides
    pub prompts: Vec<String>,
}
