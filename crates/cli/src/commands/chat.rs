//! Chat command handler.
//!
//! Reads questions in a loop until `exit`, `quit`, Ctrl-D or Ctrl-C.

use super::qa::{open_pipeline, print_answer, QaArgs};
use askdoc_core::{config::AppConfig, AppError, AppResult};
use clap::Args;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = ">> ";

const HISTORY_FILE: &str = "history.txt";

/// Interactive question loop
#[derive(Args, Debug)]
pub struct ChatCommand {
    #[command(flatten)]
    pub qa: QaArgs,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let pipeline = open_pipeline(config, &self.qa).await?;

        let mut editor = DefaultEditor::new()
            .map_err(|e| AppError::Other(format!("Failed to start line editor: {}", e)))?;
        let history = config.state_dir().join(HISTORY_FILE);
        if editor.load_history(&history).is_err() {
            tracing::debug!("No chat history at {:?}", history);
        }

        println!("Ask about the document. Type `exit` or press Ctrl-D to leave.");

        loop {
            let line = match editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    return Err(AppError::Other(format!("Failed to read input: {}", e)));
                }
            };

            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if is_exit(query) {
                break;
            }

            if let Err(e) = editor.add_history_entry(query) {
                tracing::debug!("Failed to record history entry: {}", e);
            }

            match pipeline.ask(query).await {
                Some(answer) => print_answer(&answer, false)?,
                None => eprintln!("Could not generate an answer; run with --verbose for details"),
            }
            println!();
        }

        if let Err(e) = editor.save_history(&history) {
            tracing::warn!("Failed to save chat history to {:?}: {}", history, e);
        }

        Ok(())
    }
}

fn is_exit(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_words() {
        assert!(is_exit("exit"));
        assert!(is_exit("QUIT"));
        assert!(!is_exit("exit now"));
        assert!(!is_exit("what did I do at Acme?"));
    }
}
