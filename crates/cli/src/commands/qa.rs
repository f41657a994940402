//! Question-answering setup shared by `ask` and `chat`.

use super::ingest::progress_reporter;
use askdoc_core::config::{AppConfig, ProviderConfig};
use askdoc_core::{AppError, AppResult};
use askdoc_knowledge::config::load_config;
use askdoc_knowledge::rag::citations;
use askdoc_knowledge::{Answer, AnswerGenerator, KnowledgeBase, QaPipeline, RetrievalConfig};
use askdoc_llm::{create_client, ClientOptions};
use clap::Args;
use std::path::PathBuf;

/// Retrieval flags for `ask` and `chat`.
#[derive(Args, Debug, Clone, Default)]
pub struct QaArgs {
    /// Number of chunks to retrieve
    #[arg(short = 'k', long = "top-k")]
    pub top_k: Option<usize>,

    /// Minimum score (0.0-1.0) a chunk must reach
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Answer without [DOC n] markers and the source list
    #[arg(long)]
    pub no_citations: bool,

    /// Ingest this document before answering
    #[arg(long, value_name = "PATH")]
    pub ingest: Option<PathBuf>,
}

impl QaArgs {
    /// Retrieval settings with the flags applied on top of the file.
    pub fn retrieval(&self, base: &RetrievalConfig) -> AppResult<RetrievalConfig> {
        let mut retrieval = base.clone();

        if let Some(top_k) = self.top_k {
            if top_k == 0 {
                return Err(AppError::Config("--top-k must be greater than 0".to_string()));
            }
            retrieval.top_k = top_k;
        }

        if let Some(threshold) = self.threshold {
            retrieval.score_threshold = threshold;
        }

        if self.no_citations {
            retrieval.citations = false;
        }

        Ok(retrieval)
    }
}

/// Client options for the active provider, from its config block.
pub fn client_options(config: &AppConfig) -> ClientOptions {
    let mut options = ClientOptions {
        api_key: config.resolve_api_key(&config.provider),
        ..ClientOptions::default()
    };

    match config.get_provider_config(&config.provider) {
        Some(ProviderConfig::Groq {
            endpoint,
            max_retries,
            timeout,
            reasoning_format,
            ..
        }) => {
            options.endpoint = endpoint.clone();
            if let Some(retries) = max_retries {
                options.max_retries = *retries;
            }
            options.timeout_secs = *timeout;
            if reasoning_format.is_some() {
                options.reasoning_format = reasoning_format.clone();
            }
        }
        Some(ProviderConfig::Ollama {
            endpoint, timeout, ..
        }) => {
            options.endpoint = Some(endpoint.clone());
            options.timeout_secs = *timeout;
        }
        None => {}
    }

    options
}

/// Open the index (ingesting first if asked to) and wire up the chat model.
pub async fn open_pipeline(config: &AppConfig, args: &QaArgs) -> AppResult<QaPipeline> {
    config.validate()?;

    let knowledge_config = load_config(&config.workspace)?;
    let retrieval = args.retrieval(&knowledge_config.retrieval)?;

    let knowledge = match &args.ingest {
        Some(path) => {
            let knowledge =
                KnowledgeBase::open_for_ingest(&config.workspace, knowledge_config).await?;
            let stats = knowledge.ingest(path, &progress_reporter()).await?;
            eprintln!(
                "Indexed {} chunks from {} pages in {:.2}s",
                stats.chunks, stats.pages, stats.duration_secs
            );
            knowledge
        }
        None => {
            let knowledge = KnowledgeBase::open(&config.workspace, knowledge_config).await?;
            knowledge.check_manifest()?;
            knowledge
        }
    };

    let stats = knowledge.stats().await?;
    if stats.records == 0 {
        tracing::warn!("The index is empty. Run `askdoc ingest <PATH>` first");
    }

    let client = create_client(&config.provider, &client_options(config))?;
    tracing::debug!(
        "Answering with {} ({}), top_k={}, threshold={}, citations={}",
        config.provider,
        config.model,
        retrieval.top_k,
        retrieval.score_threshold,
        retrieval.citations
    );

    let generator = AnswerGenerator::new(
        client,
        config.model.clone(),
        &config.workspace,
        retrieval.citations,
    );

    Ok(knowledge.qa_pipeline(generator, &retrieval))
}

/// Print an answer and its sources to stdout.
pub fn print_answer(answer: &Answer, json: bool) -> AppResult<()> {
    let sources = citations::citations(&answer.sources);

    if json {
        let output = serde_json::json!({
            "answer": answer.text,
            "sources": sources,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", answer.text);
    if !sources.is_empty() {
        println!();
        println!("Sources:");
        println!("{}", citations::render(&sources));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use askdoc_core::config::LlmConfig;
    use std::collections::HashMap;

    fn config_with(provider: &str, block: ProviderConfig) -> AppConfig {
        let mut providers = HashMap::new();
        providers.insert(provider.to_string(), block);
        AppConfig {
            provider: provider.to_string(),
            llm: Some(LlmConfig {
                active_provider: provider.to_string(),
                providers,
            }),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_flags_override_retrieval() {
        let args = QaArgs {
            top_k: Some(2),
            threshold: Some(0.3),
            no_citations: true,
            ingest: None,
        };
        let retrieval = args.retrieval(&RetrievalConfig::default()).unwrap();

        assert_eq!(retrieval.top_k, 2);
        assert_eq!(retrieval.score_threshold, 0.3);
        assert!(!retrieval.citations);
    }

    #[test]
    fn test_no_flags_keep_file_values() {
        let base = RetrievalConfig {
            top_k: 7,
            score_threshold: 0.2,
            citations: true,
        };
        assert_eq!(QaArgs::default().retrieval(&base).unwrap(), base);
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let args = QaArgs {
            top_k: Some(0),
            ..QaArgs::default()
        };
        assert!(matches!(
            args.retrieval(&RetrievalConfig::default()),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_groq_options_from_config() {
        let config = AppConfig {
            api_key: Some("gsk_test".to_string()),
            ..config_with(
                "groq",
                ProviderConfig::Groq {
                    api_key_env: "GROQ_API_KEY".to_string(),
                    model: "qwen/qwen3-32b".to_string(),
                    endpoint: Some("https://proxy.local/v1".to_string()),
                    max_retries: Some(5),
                    timeout: Some(60),
                    reasoning_format: None,
                },
            )
        };

        let options = client_options(&config);
        assert_eq!(options.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(options.endpoint.as_deref(), Some("https://proxy.local/v1"));
        assert_eq!(options.max_retries, 5);
        assert_eq!(options.timeout_secs, Some(60));
        assert_eq!(options.reasoning_format.as_deref(), Some("hidden"));
    }

    #[test]
    fn test_ollama_options_from_config() {
        let config = config_with(
            "ollama",
            ProviderConfig::Ollama {
                endpoint: "http://gpu-box:11434".to_string(),
                model: "llama3.2".to_string(),
                timeout: None,
            },
        );

        let options = client_options(&config);
        assert_eq!(options.endpoint.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(options.timeout_secs, None);
        assert_eq!(options.max_retries, askdoc_llm::DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_defaults_without_provider_block() {
        let config = AppConfig {
            api_key: Some("key".to_string()),
            ..AppConfig::default()
        };
        let options = client_options(&config);
        assert_eq!(options.endpoint, None);
        assert_eq!(options.timeout_secs, None);
    }
}
