//! Knowledge configuration management.
//!
//! Settings live in `.askdoc/knowledge.yaml`. Every field has a serde
//! default, so a partial file (or none at all) yields a usable config.

use crate::chunk::SplitterKind;
use crate::embeddings::EmbeddingConfig;
use crate::store::StoreConfig;
use askdoc_core::config::STATE_DIR;
use askdoc_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Chunking, embedding, storage and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeConfig {
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Maximum characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Splitting strategy
    #[serde(default)]
    pub splitter: SplitterKind,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Query-time settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Number of nearest neighbours requested from the store
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum score `1/(1+distance)` a candidate must reach
    #[serde(default)]
    pub score_threshold: f32,

    /// Attach `[DOC n]` markers and a source list to answers
    #[serde(default = "default_citations")]
    pub citations: bool,
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    70
}

fn default_top_k() -> usize {
    5
}

fn default_citations() -> bool {
    true
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            score_threshold: 0.0,
            citations: default_citations(),
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            splitter: SplitterKind::default(),
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl KnowledgeConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be greater than 0".to_string()));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("top_k must be greater than 0".to_string()));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load the knowledge configuration, falling back to defaults.
pub fn load_config(workspace: &Path) -> AppResult<KnowledgeConfig> {
    let config_path = get_config_path(workspace);

    if !config_path.exists() {
        tracing::debug!("No knowledge config at {:?}, using defaults", config_path);
        return Ok(KnowledgeConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let config: KnowledgeConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Loaded knowledge config from {:?}", config_path);
    Ok(config)
}

/// Save the knowledge configuration.
pub fn save_config(workspace: &Path, config: &KnowledgeConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let yaml = serde_yaml::to_string(config)?;
    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved knowledge config to {:?}", config_path);
    Ok(())
}

/// State directory of a workspace.
pub fn get_state_dir(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR)
}

/// Path to `knowledge.yaml`.
pub fn get_config_path(workspace: &Path) -> PathBuf {
    get_state_dir(workspace).join("knowledge.yaml")
}

/// LanceDB directory.
pub fn get_index_path(workspace: &Path) -> PathBuf {
    get_state_dir(workspace).join("index")
}

/// Ingest manifest path.
pub fn get_manifest_path(workspace: &Path) -> PathBuf {
    get_state_dir(workspace).join("manifest.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreBackend;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path()).unwrap();

        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 70);
        assert_eq!(config.splitter, SplitterKind::Recursive);
        assert_eq!(config.embedding.model, "all-minilm");
        assert_eq!(config.store.backend, StoreBackend::LanceDb);
        assert_eq!(config.retrieval.top_k, 5);
        assert!(config.retrieval.citations);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let config = KnowledgeConfig {
            chunk_size: 800,
            chunk_overlap: 100,
            ..Default::default()
        };

        save_config(temp.path(), &config).unwrap();
        assert!(temp.path().join(".askdoc/knowledge.yaml").exists());

        let loaded = load_config(temp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".askdoc");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("knowledge.yaml"),
            "chunk_size: 300\nembedding:\n  provider: trigram\nstore:\n  backend: memory\n",
        )
        .unwrap();

        let config = load_config(temp.path()).unwrap();
        assert_eq!(config.chunk_size, 300);
        assert_eq!(config.chunk_overlap, 70);
        assert_eq!(config.embedding.provider, "trigram");
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_validate_overlap() {
        let config = KnowledgeConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(KnowledgeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_paths() {
        let ws = Path::new("/tmp/ws");
        assert_eq!(get_index_path(ws), PathBuf::from("/tmp/ws/.askdoc/index"));
        assert_eq!(
            get_manifest_path(ws),
            PathBuf::from("/tmp/ws/.askdoc/manifest.json")
        );
    }
}
