//! User-facing citations for answer sources.

use super::types::RetrievedDocument;
use serde::{Deserialize, Serialize};

/// Maximum snippet length in characters.
pub const MAX_SNIPPET_CHARS: usize = 150;

/// One cited source, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationRef {
    /// "DOC n", matching the marker in the prompt context
    pub marker: String,
    pub file_name: String,
    pub page_label: String,
    pub snippet: String,
    pub score: f32,
}

impl CitationRef {
    /// `number` is the 1-based position in the source list.
    pub fn from_document(number: usize, document: &RetrievedDocument) -> Self {
        Self {
            marker: marker(number),
            file_name: document.file_name().to_string(),
            page_label: document.page_label(),
            snippet: truncate_snippet(&document.text, MAX_SNIPPET_CHARS),
            score: document.score,
        }
    }

    pub fn location(&self) -> String {
        format!("{}, page {}", self.file_name, self.page_label)
    }
}

/// Citation marker for the n-th source.
pub fn marker(number: usize) -> String {
    format!("DOC {}", number)
}

/// Citations for a source list, numbered from 1.
pub fn citations(sources: &[RetrievedDocument]) -> Vec<CitationRef> {
    sources
        .iter()
        .enumerate()
        .map(|(i, doc)| CitationRef::from_document(i + 1, doc))
        .collect()
}

/// Render a source list for the terminal.
pub fn render(citations: &[CitationRef]) -> String {
    citations
        .iter()
        .map(|c| {
            format!(
                "[{}] {} (score {:.3})\n    {}",
                c.marker,
                c.location(),
                c.score,
                c.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse whitespace and cut at a word boundary within `max_chars`.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let cut: String = collapsed.chars().take(max_chars).collect();
    let trimmed = match cut.rfind(' ') {
        Some(space) if space > 0 => &cut[..space],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(text: &str, page_label: &str, score: f32) -> RetrievedDocument {
        RetrievedDocument {
            id: "id".to_string(),
            text: text.to_string(),
            metadata: json!({ "file_name": "resume.pdf", "page_label": page_label }),
            distance: 0.0,
            score,
            rank: 4,
        }
    }

    #[test]
    fn test_markers_follow_list_position() {
        let sources = vec![document("first", "1", 0.9), document("second", "3", 0.7)];
        let refs = citations(&sources);

        assert_eq!(refs[0].marker, "DOC 1");
        assert_eq!(refs[1].marker, "DOC 2");
        assert_eq!(refs[1].location(), "resume.pdf, page 3");
    }

    #[test]
    fn test_truncate_short_text() {
        assert_eq!(truncate_snippet("Short\n  text", 100), "Short text");
    }

    #[test]
    fn test_truncate_at_word_boundary() {
        let result = truncate_snippet("This is a very long text that needs truncating", 20);
        assert_eq!(result, "This is a very long...");
    }

    #[test]
    fn test_truncate_multibyte() {
        let text = "ação ".repeat(50);
        let result = truncate_snippet(&text, 12);
        assert_eq!(result, "ação ação...");
    }

    #[test]
    fn test_render() {
        let refs = citations(&[document("Led a team of five", "2", 0.5)]);
        let rendered = render(&refs);
        assert_eq!(
            rendered,
            "[DOC 1] resume.pdf, page 2 (score 0.500)\n    Led a team of five"
        );
    }
}
