//! Stats command handler.
//!
//! Shows the ingest manifest and the number of indexed records.

use askdoc_core::{config::AppConfig, AppResult};
use askdoc_knowledge::config::load_config;
use askdoc_knowledge::KnowledgeBase;
use clap::Args;

/// Show what the index was built from
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let knowledge = KnowledgeBase::open(&config.workspace, load_config(&config.workspace)?).await?;
        let stats = knowledge.stats().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("Index: {} ({})", stats.index_path.display(), stats.backend);
        println!("  Records: {}", stats.records);
        println!("  Prompts: {}", stats.prompts.join(", "));

        match &stats.manifest {
            Some(manifest) => {
                println!("  Source: {}", manifest.source);
                println!("  SHA-256: {}", manifest.sha256);
                println!("  Pages: {}", manifest.pages);
                println!("  Chunks: {}", manifest.chunks);
                println!(
                    "  Splitter: {} (size {}, overlap {})",
                    manifest.splitter, manifest.chunk_size, manifest.chunk_overlap
                );
                println!(
                    "  Embeddings: {}/{} ({} dimensions)",
                    manifest.embedding.provider, manifest.embedding.model, manifest.embedding.dimensions
                );
                println!("  Ingested: {}", manifest.ingested_at);
            }
            None => println!("  No document ingested yet. Run `askdoc ingest <PATH>`."),
        }

        Ok(())
    }
}
