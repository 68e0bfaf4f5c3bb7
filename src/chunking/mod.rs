//! Length bucketing and word-window chunking for speaker segments.
//!
//! Short and medium segments embed whole; long segments are split into
//! overlapping word windows so context survives across chunk seams.

use crate::error::{OrdskifteError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Word-count ceiling (exclusive) for the short bucket.
const SHORT_MAX_WORDS: usize = 100;
/// Word-count ceiling (exclusive) for the medium bucket.
const MEDIUM_MAX_WORDS: usize = 500;

/// Default chunk window, in words.
pub const DEFAULT_CHUNK_SIZE: usize = 512;
/// Default overlap between neighboring chunks, in words.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Length bucket for a segment's cleaned word count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthCategory {
    Short,
    Medium,
    Long,
}

impl LengthCategory {
    /// Bucket a word count.
    pub fn for_word_count(word_count: usize) -> Self {
        if word_count < SHORT_MAX_WORDS {
            LengthCategory::Short
        } else if word_count < MEDIUM_MAX_WORDS {
            LengthCategory::Medium
        } else {
            LengthCategory::Long
        }
    }

    /// The bucket name as stored and exported.
    pub fn as_str(&self) -> &'static str {
        match self {
            LengthCategory::Short => "short",
            LengthCategory::Medium => "medium",
            LengthCategory::Long => "long",
        }
    }
}

impl fmt::Display for LengthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Splits long text into overlapping fixed-size word windows.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker. The overlap must be smaller than the chunk size or
    /// the window would never advance.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(OrdskifteError::InvalidInput(
                "chunk size must be at least 1 word".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(OrdskifteError::InvalidInput(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Chunk text into overlapping word windows.
    ///
    /// Text at or under the window size passes through as a single chunk,
    /// byte-for-byte. Otherwise each window holds `chunk_size` words and
    /// starts `chunk_size - overlap` words after its predecessor.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();

        if words.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < words.len() {
            let end = (start + self.chunk_size).min(words.len());
            let chunk = words[start..end].join(" ");
            if !chunk.trim().is_empty() {
                chunks.push(chunk);
            }
            start += step;
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n)
            .map(|i| format!("w{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(LengthCategory::for_word_count(99), LengthCategory::Short);
        assert_eq!(LengthCategory::for_word_count(100), LengthCategory::Medium);
        assert_eq!(LengthCategory::for_word_count(499), LengthCategory::Medium);
        assert_eq!(LengthCategory::for_word_count(500), LengthCategory::Long);
    }

    #[test]
    fn test_short_text_passes_through() {
        let chunker = TextChunker::default();
        let text = "just a few words";
        assert_eq!(chunker.chunk(text), vec![text.to_string()]);

        let exactly_full = words(DEFAULT_CHUNK_SIZE);
        assert_eq!(chunker.chunk(&exactly_full), vec![exactly_full.clone()]);
    }

    #[test]
    fn test_chunks_overlap_and_cover_all_words() {
        let chunker = TextChunker::default();
        let text = words(600);
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].split_whitespace().count(), 512);
        assert_eq!(chunks[1].split_whitespace().count(), 138);

        // Step is 462, so chunk 1 starts at word 462 and the last 50 words
        // of chunk 0 repeat at the head of chunk 1.
        assert!(chunks[0].starts_with("w0 "));
        assert!(chunks[1].starts_with("w462 "));
        assert!(chunks[0].ends_with("w511"));
        assert!(chunks[1].ends_with("w599"));
    }

    #[test]
    fn test_window_positions() {
        let chunker = TextChunker::new(10, 3).unwrap();
        let chunks = chunker.chunk(&words(30));

        // Steps of 7: windows at 0, 7, 14, 21, 28; the source runs out
        // under the last two.
        let counts: Vec<usize> = chunks
            .iter()
            .map(|c| c.split_whitespace().count())
            .collect();
        assert_eq!(counts, vec![10, 10, 10, 9, 2]);
    }

    #[test]
    fn test_rejects_degenerate_overlap() {
        assert!(TextChunker::new(512, 512).is_err());
        assert!(TextChunker::new(512, 600).is_err());
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(512, 511).is_ok());
    }
}
