//! Prompt loader: built-in definitions plus YAML overrides.
//!
//! Overrides live in `<workspace>/.askdoc/prompts/<id>.yaml` (or `.yml`) and
//! replace the built-in definition with the same id.

use crate::types::PromptDefinition;
use askdoc_core::config::STATE_DIR;
use askdoc_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Answer prompt without citation markers.
pub const RAG_ANSWER: &str = "rag.answer";

/// Answer prompt whose context carries `[DOC n]` markers.
pub const RAG_ANSWER_CITED: &str = "rag.answer.cited";

const ANSWER_SYSTEM: &str = "You are a helpful assistant that answers questions about a single document. \
Use the retrieved documents to answer the user query. \
If the answer is not in the context, say you don't know.";

const CITED_SYSTEM: &str = "You are a helpful assistant that answers questions about a single document. \
Use the retrieved documents to answer the user query. \
Each document is introduced by a marker such as [DOC 1]; cite the markers you relied on. \
If the answer is not in the context, say you don't know.";

const ANSWER_TEMPLATE: &str = "Context:\n{{context}}\n\nUser query:\n{{query}}";

/// Return a built-in prompt definition by id.
pub fn builtin_prompt(prompt_id: &str) -> Option<PromptDefinition> {
    let (title, system) = match prompt_id {
        RAG_ANSWER => ("Answer from retrieved context", ANSWER_SYSTEM),
        RAG_ANSWER_CITED => ("Answer from retrieved context with citations", CITED_SYSTEM),
        _ => return None,
    };

    Some(PromptDefinition {
        id: prompt_id.to_string(),
        title: title.to_string(),
        system: Some(system.to_string()),
        template: ANSWER_TEMPLATE.to_string(),
    })
}

/// Load a prompt definition by ID.
///
/// A workspace override takes precedence over the built-in definition.
///
/// # Example
/// ```no_run
/// use askdoc_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "rag.answer")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    if let Some(prompt_file) = find_override(workspace_path, prompt_id) {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to parse prompt YAML {:?}: {}",
                prompt_file, e
            ))
        })?;

        validate_prompt(&definition)?;
        tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    builtin_prompt(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", prompt_id)))
}

/// List all available prompt IDs: built-ins and workspace overrides, sorted.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids = vec![RAG_ANSWER.to_string(), RAG_ANSWER_CITED.to_string()];
    let prompts_dir = prompts_dir(workspace_path);

    if prompts_dir.exists() {
        for entry in walkdir::WalkDir::new(&prompts_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_yaml = matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("yaml") | Some("yml")
            );
            if path.is_file() && is_yaml {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(STATE_DIR).join("prompts")
}

fn find_override(workspace_path: &Path, prompt_id: &str) -> Option<PathBuf> {
    let dir = prompts_dir(workspace_path);
    ["yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", prompt_id, ext)))
        .find(|path| path.is_file())
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, file_name: &str, content: &str) {
        let prompts_dir = dir.join(".askdoc/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        fs::write(prompts_dir.join(file_name), content).unwrap();
    }

    #[test]
    fn test_builtin_prompts() {
        let plain = builtin_prompt(RAG_ANSWER).unwrap();
        assert!(plain.system.unwrap().contains("say you don't know"));

        let cited = builtin_prompt(RAG_ANSWER_CITED).unwrap();
        assert!(cited.system.unwrap().contains("[DOC 1]"));
        assert_eq!(cited.template, ANSWER_TEMPLATE);

        assert!(builtin_prompt("agent.ask").is_none());
    }

    #[test]
    fn test_load_builtin_without_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), RAG_ANSWER).unwrap();
        assert_eq!(prompt.id, RAG_ANSWER);
    }

    #[test]
    fn test_override_replaces_builtin() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            "rag.answer.yaml",
            "id: rag.answer\ntitle: HR assistant\nsystem: \"You analyse CVs.\"\ntemplate: \"{{context}} / {{query}}\"\n",
        );

        let prompt = load_prompt(temp_dir.path(), RAG_ANSWER).unwrap();
        assert_eq!(prompt.title, "HR assistant");
        assert_eq!(prompt.system.as_deref(), Some("You analyse CVs."));
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(temp_dir.path(), "nonexistent").is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), "broken.yml", "invalid: yaml: content:");
        assert!(load_prompt(temp_dir.path(), "broken").is_err());
    }

    #[test]
    fn test_empty_template_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            "empty.yaml",
            "id: empty\ntitle: Empty\ntemplate: \"  \"\n",
        );
        assert!(load_prompt(temp_dir.path(), "empty").is_err());
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            "custom.yaml",
            "id: custom\ntitle: Custom\ntemplate: \"{{query}}\"\n",
        );
        write_override(
            temp_dir.path(),
            "rag.answer.yml",
            "id: rag.answer\ntitle: Override\ntemplate: \"{{query}}\"\n",
        );

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts, vec!["custom", "rag.answer", "rag.answer.cited"]);
    }
}
