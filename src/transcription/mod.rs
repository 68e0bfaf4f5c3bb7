//! Speech-to-text transcription boundary.
//!
//! The pipeline only sees the [`Transcriber`] trait; the provider behind it
//! turns audio bytes into the nested transcript structure.

mod deepgram;

pub use deepgram::DeepgramTranscriber;

use crate::error::Result;
use crate::transcript::RawTranscript;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription providers.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file into the provider's nested transcript.
    async fn transcribe(&self, audio_path: &Path) -> Result<RawTranscript>;
}
