//! Recursive character splitter.
//!
//! Tries separators from coarse to fine: paragraphs, lines, words, then
//! single characters. Lengths are counted in characters.

use super::{ChunkSplitter, TextSpan};
use askdoc_core::{AppError, AppResult};
use std::collections::VecDeque;
use unicode_segmentation::UnicodeSegmentation;

/// Paragraph, line, word, character.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text on the first separator it contains and merges the pieces
/// back into chunks of at most `chunk_size` characters.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    /// Create a splitter with the default separators.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        Self::with_separators(
            chunk_size,
            chunk_overlap,
            DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Create a splitter with custom separators, coarsest first.
    pub fn with_separators(
        chunk_size: usize,
        chunk_overlap: usize,
        separators: Vec<String>,
    ) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be greater than 0".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators,
        })
    }

    /// Split text into trimmed chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];

        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small_pieces: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                small_pieces.push(piece);
                continue;
            }

            if !small_pieces.is_empty() {
                chunks.extend(self.merge_pieces(&small_pieces));
                small_pieces.clear();
            }

            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !small_pieces.is_empty() {
            chunks.extend(self.merge_pieces(&small_pieces));
        }

        chunks
    }

    /// Merge pieces into chunks, carrying a tail of at most `chunk_overlap`
    /// characters into the next chunk.
    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window);

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        push_joined(&mut chunks, &window);
        chunks
    }
}

impl ChunkSplitter for RecursiveCharacterSplitter {
    fn name(&self) -> &'static str {
        "recursive"
    }

    fn split(&self, text: &str) -> AppResult<Vec<TextSpan>> {
        let chunks = self.split_text(text);
        Ok(locate_spans(text, chunks, self.chunk_overlap))
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<(&str, usize)>) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split on every occurrence of `separator`, keeping it at the start of the
/// following piece. Empty pieces are dropped. An empty separator splits
/// into grapheme clusters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text.graphemes(true).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, _) in text.match_indices(separator) {
        if index > start {
            pieces.push(&text[start..index]);
        }
        start = index;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Find each chunk's character offset, searching forward from the end of
/// the previous chunk minus the overlap.
fn locate_spans(text: &str, chunks: Vec<String>, overlap: usize) -> Vec<TextSpan> {
    let mut spans = Vec::with_capacity(chunks.len());
    let mut index = 0;
    let mut previous_len = 0;

    for chunk in chunks {
        let from = step_back(text, index + previous_len, overlap);
        let found = text[from..]
            .find(chunk.as_str())
            .map(|offset| from + offset)
            .or_else(|| text.find(chunk.as_str()));

        if let Some(byte_index) = found {
            index = byte_index;
            previous_len = chunk.len();
        }

        spans.push(TextSpan {
            start: text[..index].chars().count(),
            text: chunk,
        });
    }

    spans
}

/// Byte offset `n` characters before `end`.
fn step_back(text: &str, end: usize, n: usize) -> usize {
    text[..end]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(size: usize, overlap: usize) -> RecursiveCharacterSplitter {
        RecursiveCharacterSplitter::new(size, overlap).unwrap()
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = splitter(500, 70).split_text("  Jane Doe, Software Engineer  ");
        assert_eq!(chunks, vec!["Jane Doe, Software Engineer"]);
    }

    #[test]
    fn test_empty_and_whitespace_text() {
        assert!(splitter(10, 2).split_text("").is_empty());
        assert!(splitter(10, 2).split_text(" \n\n \n ").is_empty());
    }

    #[test]
    fn test_iterative_splitting() {
        let text = "Hi.\n\nI'm Harrison.\n\nHow? Are? You?\nOkay then f f f f.\n\
                    This is a weird text to write, but gotta test the splittingggg some how.\n\n\
                    Bye!\n\n-H.";
        let chunks = splitter(10, 1).split_text(text);
        let expected = vec![
            "Hi.",
            "I'm",
            "Harrison.",
            "How? Are?",
            "You?",
            "Okay then",
            "f f f f.",
            "This is a",
            "weird",
            "text to",
            "write,",
            "but gotta",
            "test the",
            "splitting",
            "gggg",
            "some how.",
            "Bye!",
            "-H.",
        ];
        assert_eq!(chunks, expected);
    }

    #[test]
    fn test_word_overlap() {
        let chunks = splitter(10, 5).split_text("aa bb cc dd ee");
        assert_eq!(chunks, vec!["aa bb cc", "cc dd ee"]);
    }

    #[test]
    fn test_separator_counts_toward_overlap() {
        let chunks = splitter(7, 3).split_text("foo bar baz 123");
        assert_eq!(chunks, vec!["foo bar", "baz", "123"]);
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let chunks = splitter(4, 0).split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_paragraphs_preferred_over_lines() {
        let text = "first paragraph line one\nline two\n\nsecond paragraph";
        let chunks = splitter(40, 0).split_text(text);
        assert_eq!(
            chunks,
            vec!["first paragraph line one\nline two", "second paragraph"]
        );
    }

    #[test]
    fn test_size_and_overlap_bounds() {
        let text = (0..400)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let size = 120;
        let overlap = 20;
        let chunks = splitter(size, overlap).split_text(&text);

        assert!(chunks.len() > 20);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= size, "chunk too long: {}", chunk);
        }

        for pair in chunks.windows(2) {
            let shared = longest_suffix_prefix(&pair[0], &pair[1]);
            assert!(shared <= overlap, "overlap {} exceeds {}", shared, overlap);
        }
    }

    #[test]
    fn test_multibyte_text() {
        let text = "Acentuação: ã, õ, ç, á, é. Emoji: 🚀 🎯 💡 ✨ 🔥. ".repeat(30);
        let chunks = splitter(50, 10).split_text(&text);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50);
        }
    }

    #[test]
    fn test_invalid_overlap() {
        assert!(RecursiveCharacterSplitter::new(10, 10).is_err());
        assert!(RecursiveCharacterSplitter::new(0, 0).is_err());
    }

    #[test]
    fn test_span_offsets() {
        let spans = splitter(10, 5).split("aa bb cc dd ee").unwrap();
        let starts: Vec<usize> = spans.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 6]);
        assert_eq!(splitter(10, 5).name(), "recursive");
    }

    #[test]
    fn test_span_offsets_multibyte() {
        let text = "ééé ààà ôôô";
        let spans = splitter(7, 3).split(text).unwrap();
        for span in &spans {
            let located: String = text.chars().skip(span.start).take(span.text.chars().count()).collect();
            assert_eq!(located, span.text);
        }
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(
            split_keeping_separator("a\n\nb\n\n\n\nc", "\n\n"),
            vec!["a", "\n\nb", "\n\n", "\n\nc"]
        );
        assert_eq!(split_keeping_separator("\n\nb", "\n\n"), vec!["\n\nb"]);
        assert_eq!(split_keeping_separator("e\u{301}x", ""), vec!["e\u{301}", "x"]);
    }

    fn longest_suffix_prefix(a: &str, b: &str) -> usize {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        (0..=a.len().min(b.len()))
            .rev()
            .find(|&n| a[a.len() - n..] == b[..n])
            .unwrap_or(0)
    }
}
