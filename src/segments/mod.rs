//! Embedding-ready segment production.
//!
//! Cleans formatted speaker segments and buckets them by length: short and
//! medium segments embed whole, long segments become overlapping chunks.

use crate::chunking::{LengthCategory, TextChunker};
use crate::text::TextPreprocessor;
use crate::transcript::SpeakerSegment;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a processed segment was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Short,
    Medium,
    Chunk,
}

/// A cleaned segment (or chunk of one) ready for the embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedSegment {
    pub speaker: String,
    pub text: String,
    pub kind: SegmentKind,
    pub word_count: usize,
    pub length_category: LengthCategory,
    /// 0-based position among this source segment's chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,
    /// Word count of the cleaned source segment before chunking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_length: Option<usize>,
}

/// Turns formatted speaker segments into embedding-ready units.
#[derive(Debug, Clone)]
pub struct SegmentProcessor {
    preprocessor: TextPreprocessor,
    chunker: TextChunker,
}

impl SegmentProcessor {
    pub fn new() -> Self {
        Self {
            preprocessor: TextPreprocessor::new(),
            chunker: TextChunker::default(),
        }
    }

    /// Use a custom chunker (window size and overlap from settings).
    pub fn with_chunker(chunker: TextChunker) -> Self {
        Self {
            preprocessor: TextPreprocessor::new(),
            chunker,
        }
    }

    /// Clean and bucket segments, preserving input order. Segments that
    /// clean down to nothing are dropped; chunks of one source segment are
    /// emitted consecutively in index order.
    pub fn process(&self, segments: &[SpeakerSegment]) -> Vec<ProcessedSegment> {
        let mut processed = Vec::new();
        let mut dropped = 0usize;

        for segment in segments {
            let cleaned = self.preprocessor.clean(&segment.text);
            if cleaned.is_empty() {
                dropped += 1;
                continue;
            }

            let word_count = cleaned.split_whitespace().count();
            let category = LengthCategory::for_word_count(word_count);

            match category {
                LengthCategory::Short | LengthCategory::Medium => {
                    let kind = if category == LengthCategory::Short {
                        SegmentKind::Short
                    } else {
                        SegmentKind::Medium
                    };
                    processed.push(ProcessedSegment {
                        speaker: segment.speaker.clone(),
                        text: cleaned,
                        kind,
                        word_count,
                        length_category: category,
                        chunk_index: None,
                        total_chunks: None,
                        original_length: None,
                    });
                }
                LengthCategory::Long => {
                    let chunks = self.chunker.chunk(&cleaned);
                    let total_chunks = chunks.len();

                    for (chunk_index, chunk) in chunks.into_iter().enumerate() {
                        let chunk_word_count = chunk.split_whitespace().count();
                        processed.push(ProcessedSegment {
                            speaker: segment.speaker.clone(),
                            text: chunk,
                            kind: SegmentKind::Chunk,
                            word_count: chunk_word_count,
                            length_category: category,
                            chunk_index: Some(chunk_index),
                            total_chunks: Some(total_chunks),
                            original_length: Some(word_count),
                        });
                    }
                }
            }
        }

        if dropped > 0 {
            debug!("Dropped {} segment(s) that cleaned down to nothing", dropped);
        }

        processed
    }
}

impl Default for SegmentProcessor {
    fn default() -> Self {
        Self::new()
    }
}
