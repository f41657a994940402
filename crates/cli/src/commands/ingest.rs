//! Ingest command handler.
//!
//! Replaces the index with the contents of one document.

use askdoc_core::{config::AppConfig, AppResult};
use askdoc_knowledge::config::load_config;
use askdoc_knowledge::{KnowledgeBase, ProgressEvent, ProgressReporter};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Load, chunk, embed and index a document
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Document to index (.pdf, .txt, .md)
    pub path: PathBuf,

    /// Maximum chunk length in characters
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {:?}", self.path);

        let mut knowledge_config = load_config(&config.workspace)?;
        if let Some(size) = self.chunk_size {
            knowledge_config.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            knowledge_config.chunk_overlap = overlap;
        }

        let knowledge =
            KnowledgeBase::open_for_ingest(&config.workspace, knowledge_config).await?;
        let stats = knowledge.ingest(&self.path, &progress_reporter()).await?;

        if self.json {
            let output = serde_json::json!({
                "source": self.path,
                "pages": stats.pages,
                "chunks": stats.chunks,
                "bytes": stats.bytes,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} ({} pages, {} chunks, {} bytes) in {:.2}s",
                self.path.display(),
                stats.pages,
                stats.chunks,
                stats.bytes,
                stats.duration_secs
            );
        }

        Ok(())
    }
}

/// Progress lines go to stderr so stdout stays clean for answers and JSON.
pub fn progress_reporter() -> ProgressReporter {
    ProgressReporter::new(Arc::new(|event: ProgressEvent| {
        eprintln!("{}", event.format_simple());
    }))
}
