//! Vector similarity search over embedded transcript segments.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::store::{EpisodeStore, SegmentMatch};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Embeds a query and ranks stored segments against it.
pub struct VectorSearch {
    store: Arc<dyn EpisodeStore>,
    embedder: Arc<dyn Embedder>,
}

impl VectorSearch {
    pub fn new(store: Arc<dyn EpisodeStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// The most similar segments, best first, without threshold filtering.
    #[instrument(skip(self))]
    pub async fn find_most_similar(&self, query: &str, limit: usize) -> Result<Vec<SegmentMatch>> {
        let embedding = self.embedder.embed(query).await?;
        let matches = self.store.search(&embedding, limit, None).await?;
        debug!("Query matched {} segments", matches.len());
        Ok(matches)
    }

    /// Like [`Self::find_most_similar`], keeping only matches whose
    /// similarity exceeds `threshold`.
    #[instrument(skip(self))]
    pub async fn find_similar_above_threshold(
        &self,
        query: &str,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<SegmentMatch>> {
        let embedding = self.embedder.embed(query).await?;
        self.store.search(&embedding, limit, Some(threshold)).await
    }
}
