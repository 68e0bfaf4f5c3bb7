//! Ordskifte - Podcast Transcription and RAG
//!
//! A batch pipeline that transcribes podcast episodes, segments the
//! transcripts by speaker, embeds the cleaned segments, and answers
//! questions about the show with retrieval-augmented generation.
//!
//! The name "Ordskifte" comes from the Norwegian word for an exchange of
//! words - a debate.
//!
//! # Overview
//!
//! Ordskifte allows you to:
//! - Transcribe episode audio with speaker diarization
//! - Merge diarized paragraphs into speaker-attributed segments
//! - Clean, bucket, and chunk segments for embedding
//! - Store embedded segments in a local database
//! - Ask questions and get AI-generated answers grounded in the transcripts
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `text` - Text normalization and cleanup
//! - `chunking` - Length bucketing and word-window chunking
//! - `transcript` - Transcript model, speaker segmentation, and export
//! - `segments` - Embedding-ready segment production
//! - `transcription` - Speech-to-text boundary
//! - `embedding` - Embedding generation
//! - `store` - Episode and segment storage
//! - `pipeline` - Pipeline coordination
//! - `rag` - Vector search and question answering
//!
//! # Example
//!
//! ```rust,no_run
//! use ordskifte::config::Settings;
//! use ordskifte::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     // Process every unprocessed episode through the full pipeline
//!     let summary = pipeline.run().await?;
//!     println!("Processed {} episodes", summary.processed);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod pipeline;
pub mod rag;
pub mod segments;
pub mod store;
pub mod text;
pub mod transcript;
pub mod transcription;

pub use error::{OrdskifteError, Result};
