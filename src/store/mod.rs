//! Episode and segment storage.
//!
//! Trait-based interface over the relational store holding episodes,
//! speakers, the per-episode speaker assignments, and embedded transcript
//! segments.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An episode row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Stable episode key (the show's public numbering).
    pub episode_number: i64,
    pub title: String,
    /// Source audio file name within the configured audio directory.
    pub file_name: String,
    pub date_published: Option<NaiveDate>,
    /// Set only after embeddings for the episode were persisted.
    pub is_processed: bool,
}

/// Episode summary for listings.
#[derive(Debug, Clone)]
pub struct EpisodeInfo {
    pub episode_number: i64,
    pub title: String,
    pub file_name: String,
    pub is_processed: bool,
    pub segment_count: i64,
}

/// One row of the unprocessed-work query: episode metadata joined with a
/// single (speaker_number, speaker) assignment. The pipeline regroups these
/// into one payload per episode.
#[derive(Debug, Clone)]
pub struct WorkRow {
    pub episode_number: i64,
    pub file_name: String,
    pub speaker_number: i64,
    pub speaker_name: String,
    pub speaker_id: i64,
}

/// An embedded segment ready for persistence.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub speaker_id: i64,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A similarity-search hit.
#[derive(Debug, Clone)]
pub struct SegmentMatch {
    pub speaker: String,
    pub text: String,
    pub similarity: f32,
}

/// Trait for episode stores.
#[async_trait]
pub trait EpisodeStore: Send + Sync {
    /// Verify the store is reachable. Called once before a pipeline run;
    /// failure is fatal for the whole run.
    async fn validate_connection(&self) -> Result<()>;

    /// Flat unprocessed work rows, one per (episode, speaker), ordered by
    /// episode number then speaker number.
    async fn fetch_unprocessed(&self) -> Result<Vec<WorkRow>>;

    /// Persist one episode's embeddings in a single transaction. Returns the
    /// number of rows written.
    async fn store_embeddings(
        &self,
        episode_number: i64,
        records: &[EmbeddingRecord],
    ) -> Result<usize>;

    /// Flip the episode's processed flag.
    async fn mark_processed(&self, episode_number: i64) -> Result<()>;

    /// Rank stored segments by cosine similarity to the query embedding,
    /// descending, keeping matches above `min_similarity` when given.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_similarity: Option<f32>,
    ) -> Result<Vec<SegmentMatch>>;

    /// All episodes with their stored segment counts.
    async fn list_episodes(&self) -> Result<Vec<EpisodeInfo>>;

    /// Total stored segment count.
    async fn segment_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
