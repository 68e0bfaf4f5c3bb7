//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::rag::VectorSearch;
use crate::store::SqliteStore;
use anyhow::Result;
use std::sync::Arc;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: usize,
    threshold: Option<f32>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        Output::info("Run 'ordskifte doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let store = Arc::new(SqliteStore::new(&settings.database_path())?);
    let embedder = Arc::new(OpenAIEmbedder::with_config(
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    ));

    let search = VectorSearch::new(store, embedder);
    let spinner = Output::spinner("Searching...");

    let results = match threshold.or(settings.rag.similarity_threshold) {
        Some(min) => search.find_similar_above_threshold(query, min, limit).await,
        None => search.find_most_similar(query, limit).await,
    };
    spinner.finish_and_clear();

    match results {
        Ok(matches) => {
            if matches.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", matches.len()));
                for segment_match in &matches {
                    Output::search_result(
                        &segment_match.speaker,
                        segment_match.similarity,
                        &segment_match.text,
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            Err(e.into())
        }
    }
}
