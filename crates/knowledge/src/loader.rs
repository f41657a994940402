//! Document loading and page extraction.
//!
//! PDFs are read with `lopdf`, one entry per page. Anything else must be
//! UTF-8 text; form feeds (`\x0c`) split it into pages.

use crate::chunk::metadata::sha256_hex;
use askdoc_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

const FORM_FEED: char = '\x0c';

/// Document kind, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Detect document kind from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") => Self::Pdf,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "text",
        }
    }
}

/// One page of a loaded document.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 0-based page index
    pub number: usize,

    /// 1-based label shown to users
    pub label: String,

    pub text: String,
}

/// A document split into pages.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Path as given by the caller
    pub source: PathBuf,
    pub file_name: String,
    pub kind: DocumentKind,
    pub pages: Vec<Page>,

    /// Size of the file on disk
    pub bytes: u64,

    /// SHA-256 of the file contents
    pub sha256: String,
}

/// Load a document from disk.
pub fn load_document(path: &Path) -> AppResult<LoadedDocument> {
    let raw = fs::read(path)
        .map_err(|e| AppError::Document(format!("Failed to read {:?}: {}", path, e)))?;

    let kind = DocumentKind::from_path(path);
    let texts = match kind {
        DocumentKind::Pdf => extract_pdf_pages(path, &raw)?,
        DocumentKind::Text => {
            let text = String::from_utf8(raw.clone()).map_err(|_| {
                AppError::Document(format!("{:?} is neither a PDF nor UTF-8 text", path))
            })?;
            split_text_pages(&text)
        }
    };

    let pages = texts
        .into_iter()
        .enumerate()
        .map(|(number, text)| Page {
            number,
            label: (number + 1).to_string(),
            text,
        })
        .collect::<Vec<_>>();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    tracing::info!(
        "Loaded {} ({}): {} pages, {} bytes",
        file_name,
        kind.as_str(),
        pages.len(),
        raw.len()
    );

    Ok(LoadedDocument {
        source: path.to_path_buf(),
        file_name,
        kind,
        pages,
        bytes: raw.len() as u64,
        sha256: sha256_hex(&raw),
    })
}

/// Extract text for every page, in page order.
///
/// A page whose text cannot be extracted is kept as an empty page so page
/// numbers stay aligned with the PDF.
fn extract_pdf_pages(path: &Path, raw: &[u8]) -> AppResult<Vec<String>> {
    let document = lopdf::Document::load_mem(raw)
        .map_err(|e| AppError::Document(format!("Failed to parse PDF {:?}: {}", path, e)))?;

    let pages = document.get_pages();
    let mut texts = Vec::with_capacity(pages.len());

    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => texts.push(text),
            Err(e) => {
                tracing::warn!(
                    "Could not extract text from page {} of {:?}: {}",
                    page_number,
                    path,
                    e
                );
                texts.push(String::new());
            }
        }
    }

    Ok(texts)
}

fn split_text_pages(text: &str) -> Vec<String> {
    text.split(FORM_FEED).map(str::to_string).collect()
}
