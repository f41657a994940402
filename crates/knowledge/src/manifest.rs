//! Ingest manifest: what the current index was built from.

use crate::config::get_manifest_path;
use crate::embeddings::EmbeddingConfig;
use askdoc_core::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Written after every successful ingestion, next to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestManifest {
    /// Source path as given at ingestion
    pub source: String,
    pub file_name: String,

    /// SHA-256 of the source file
    pub sha256: String,

    pub bytes: u64,
    pub pages: usize,
    pub chunks: usize,

    pub splitter: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,

    /// Embedding setup the vectors were produced with
    pub embedding: EmbeddingConfig,

    pub ingested_at: DateTime<Utc>,
}

impl IngestManifest {
    pub fn save(&self, workspace: &Path) -> AppResult<()> {
        let path = get_manifest_path(workspace);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|e| {
            AppError::Other(format!("Failed to write manifest to {:?}: {}", path, e))
        })?;

        tracing::debug!("Saved ingest manifest to {:?}", path);
        Ok(())
    }

    /// Load the manifest, if the workspace has been ingested.
    pub fn load(workspace: &Path) -> AppResult<Option<Self>> {
        let path = get_manifest_path(workspace);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let manifest = serde_json::from_str(&content).map_err(|e| {
            AppError::Serialization(format!("Failed to parse manifest {:?}: {}", path, e))
        })?;
        Ok(Some(manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest() -> IngestManifest {
        IngestManifest {
            source: "data/resume.pdf".to_string(),
            file_name: "resume.pdf".to_string(),
            sha256: "ab".repeat(32),
            bytes: 52_000,
            pages: 2,
            chunks: 14,
            splitter: "recursive".to_string(),
            chunk_size: 500,
            chunk_overlap: 70,
            embedding: EmbeddingConfig::default(),
            ingested_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_manifest() {
        let temp = TempDir::new().unwrap();
        assert!(IngestManifest::load(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let original = manifest();
        original.save(temp.path()).unwrap();

        let loaded = IngestManifest::load(temp.path()).unwrap().unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_corrupt_manifest_is_error() {
        let temp = TempDir::new().unwrap();
        let path = get_manifest_path(temp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            IngestManifest::load(temp.path()),
            Err(AppError::Serialization(_))
        ));
    }
}
