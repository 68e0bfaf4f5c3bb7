//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::rag::RagEngine;
use crate::store::SqliteStore;
use anyhow::Result;
use std::sync::Arc;

/// Run the ask command.
pub async fn run_ask(question: &str, model: Option<String>, settings: Settings) -> Result<()> {
    // Pre-flight checks
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

    let model = model.unwrap_or_else(|| settings.rag.model.clone());
    let engine = RagEngine::new(
        store,
        embedder,
        &model,
        &settings.rag.podcast_name,
        settings.rag.max_results,
    );

    let spinner = Output::spinner("Searching transcripts...");

    match engine.answer(question).await {
        Ok(answer) => {
            spinner.finish_and_clear();
            println!("\n{}\n", answer);
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            Err(e.into())
        }
    }
}
