//! CLI module for Ordskifte.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Ordskifte - Podcast Transcription and RAG
///
/// A batch pipeline that transcribes podcast episodes, embeds the cleaned
/// transcripts, and answers questions about the show. The name "Ordskifte"
/// comes from the Norwegian word for an exchange of words - a debate.
#[derive(Parser, Debug)]
#[command(name = "ordskifte")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline over every unprocessed episode
    Process,

    /// Re-format saved raw transcripts without re-transcribing
    Format,

    /// Ask a question and get an answer grounded in the transcripts
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Search for transcript segments similar to a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity (0.0-1.0); omit to rank without a floor
        #[arg(short, long)]
        threshold: Option<f32>,
    },

    /// Start an interactive chat session
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List episodes and their processing state
    List,

    /// Seed the episode database from a TOML file
    Seed {
        /// Path to the episodes file
        file: String,

        /// Drop and recreate all tables first (deletes stored segments!)
        #[arg(long)]
        reset: bool,
    },

    /// Check configuration and environment requirements
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
