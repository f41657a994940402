//! Ask command handler.
//!
//! Answers a single question from the indexed document.

use super::qa::{open_pipeline, print_answer, QaArgs};
use askdoc_core::{config::AppConfig, AppError, AppResult};
use clap::Args;

/// Answer one question from the indexed document
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    #[command(flatten)]
    pub qa: QaArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let pipeline = open_pipeline(config, &self.qa).await?;

        match pipeline.ask(&self.query).await {
            Some(answer) => print_answer(&answer, self.json),
            None => Err(AppError::Llm(
                "No answer was generated; run with --verbose for details".to_string(),
            )),
        }
    }
}
