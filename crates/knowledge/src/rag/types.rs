//! Retrieval and answer types.

use serde::{Deserialize, Serialize};

/// A stored chunk returned by the retriever, with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: String,
    pub text: String,
    pub metadata: serde_json::Value,

    /// Squared Euclidean distance reported by the store
    pub distance: f32,

    /// `1 / (1 + distance)`, in `(0, 1]`
    pub score: f32,

    /// 1-based position in the store result
    pub rank: usize,
}

impl RetrievedDocument {
    pub fn file_name(&self) -> &str {
        self.metadata
            .get("file_name")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
    }

    /// 1-based page label, falling back to the 0-based page index + 1.
    pub fn page_label(&self) -> String {
        if let Some(label) = self.metadata.get("page_label").and_then(|v| v.as_str()) {
            return label.to_string();
        }
        self.metadata
            .get("page")
            .and_then(|v| v.as_u64())
            .map(|p| (p + 1).to_string())
            .unwrap_or_else(|| "?".to_string())
    }
}

/// A generated answer and the documents it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,

    /// Empty when citations are disabled
    pub sources: Vec<RetrievedDocument>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(metadata: serde_json::Value) -> RetrievedDocument {
        RetrievedDocument {
            id: "1".to_string(),
            text: "Jane Doe".to_string(),
            metadata,
            distance: 0.5,
            score: 1.0 / 1.5,
            rank: 1,
        }
    }

    #[test]
    fn test_location_from_metadata() {
        let doc = document(json!({ "file_name": "resume.pdf", "page": 1, "page_label": "2" }));
        assert_eq!(doc.file_name(), "resume.pdf");
        assert_eq!(doc.page_label(), "2");
    }

    #[test]
    fn test_location_fallbacks() {
        let doc = document(json!({ "page": 4 }));
        assert_eq!(doc.file_name(), "unknown");
        assert_eq!(doc.page_label(), "5");

        assert_eq!(document(json!({})).page_label(), "?");
    }

    #[test]
    fn test_answer_serialization() {
        let answer = Answer {
            text: "Jane worked at Acme.".to_string(),
            sources: vec![document(json!({ "file_name": "resume.pdf" }))],
        };
        let value = serde_json::to_value(&answer).unwrap();
        assert_eq!(value["text"], "Jane worked at Acme.");
        assert_eq!(value["sources"][0]["rank"], 1);
    }
}
