//! Answer generation from retrieved context.

use super::citations::marker;
use super::types::{Answer, RetrievedDocument};
use askdoc_core::AppResult;
use askdoc_llm::{LlmClient, LlmRequest};
use askdoc_prompt::{build_prompt, load_prompt, RAG_ANSWER, RAG_ANSWER_CITED};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Context shown to the model when nothing was retrieved.
pub const EMPTY_CONTEXT: &str = "(no documents retrieved)";

/// Format retrieved documents as prompt context.
///
/// With citations each document is introduced by `[DOC n] file, page p`,
/// numbered by its position in `documents`.
pub fn format_context(documents: &[RetrievedDocument], citations: bool) -> String {
    if documents.is_empty() {
        return EMPTY_CONTEXT.to_string();
    }

    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            if citations {
                format!(
                    "[{}] {}, page {}\n{}",
                    marker(i + 1),
                    doc.file_name(),
                    doc.page_label(),
                    doc.text
                )
            } else {
                doc.text.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Drop a leading `<think>...</think>` block some reasoning models emit.
fn strip_reasoning(content: &str) -> &str {
    let trimmed = content.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<think>") {
        if let Some(end) = rest.find("</think>") {
            return rest[end + "</think>".len()..].trim();
        }
    }
    content.trim()
}

/// Calls the chat model with retrieved context.
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    workspace: PathBuf,
    citations: bool,
}

impl AnswerGenerator {
    /// `workspace` is searched for prompt overrides.
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        workspace: &Path,
        citations: bool,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            workspace: workspace.to_path_buf(),
            citations,
        }
    }

    /// Generate an answer, or `None` if prompt rendering or the model call
    /// fails. The failure is logged at error level.
    pub async fn generate(&self, query: &str, documents: &[RetrievedDocument]) -> Option<Answer> {
        match self.try_generate(query, documents).await {
            Ok(answer) => Some(answer),
            Err(e) => {
                tracing::error!("Error generating response: {}", e);
                None
            }
        }
    }

    async fn try_generate(&self, query: &str, documents: &[RetrievedDocument]) -> AppResult<Answer> {
        let prompt_id = if self.citations {
            RAG_ANSWER_CITED
        } else {
            RAG_ANSWER
        };
        let definition = load_prompt(&self.workspace, prompt_id)?;

        let mut variables = HashMap::new();
        variables.insert(
            "context".to_string(),
            format_context(documents, self.citations),
        );
        variables.insert("query".to_string(), query.to_string());
        let prompt = build_prompt(&definition, variables)?;

        let mut request = LlmRequest::new(prompt.user, self.model.as_str()).with_temperature(0.0);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        tracing::debug!(
            "Generating answer with {} ({} context documents)",
            self.client.provider_name(),
            documents.len()
        );

        let response = self.client.complete(&request).await?;

        Ok(Answer {
            text: strip_reasoning(&response.content).to_string(),
            sources: if self.citations {
                documents.to_vec()
            } else {
                Vec::new()
            },
        })
    }
}
