//! Interactive chat command.
//!
//! A small REPL over the RAG engine; every question is answered
//! independently against the transcript store.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::error::Result;
use crate::rag::RagEngine;
use crate::store::SqliteStore;
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        Output::info("Run 'ordskifte doctor' for detailed diagnostics.");
        return Err(e);
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

    println!("\n{}", style("Ordskifte Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the show. Type 'exit' or 'quit' to end the conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        stdin.lock().read_line(&mut input)?;

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        let spinner = Output::spinner("Thinking...");
        match engine.answer(input).await {
            Ok(answer) => {
                spinner.finish_and_clear();
                println!("\n{} {}\n", style("Ordskifte:").cyan().bold(), answer);
            }
            Err(e) => {
                spinner.finish_and_clear();
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
