//! Deepgram pre-recorded transcription implementation.

use super::Transcriber;
use crate::error::{OrdskifteError, Result};
use crate::transcript::RawTranscript;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

const LISTEN_URL: &str = "https://api.deepgram.com/v1/listen";

/// Long timeout: a full episode upload plus transcription can take minutes.
const REQUEST_TIMEOUT_SECS: u64 = 600;

/// Deepgram-based transcriber with diarization enabled.
pub struct DeepgramTranscriber {
    client: reqwest::Client,
    api_key: String,
    model: String,
    language: String,
}

impl DeepgramTranscriber {
    /// Create a transcriber. The API key comes from `DEEPGRAM_API_KEY`;
    /// a missing or empty key is a configuration error.
    pub fn new(model: &str, language: &str) -> Result<Self> {
        let api_key = std::env::var("DEEPGRAM_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                OrdskifteError::Config("DEEPGRAM_API_KEY not set in environment".to_string())
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: model.to_string(),
            language: language.to_string(),
        })
    }
}

#[async_trait]
impl Transcriber for DeepgramTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<RawTranscript> {
        if !audio_path.exists() {
            return Err(OrdskifteError::Transcription(format!(
                "Audio file not found: {}",
                audio_path.display()
            )));
        }

        let audio_bytes = tokio::fs::read(audio_path).await?;
        debug!("Submitting {} bytes for transcription", audio_bytes.len());

        let response = self
            .client
            .post(LISTEN_URL)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/mpeg")
            .query(&[
                ("model", self.model.as_str()),
                ("language", self.language.as_str()),
                ("smart_format", "true"),
                ("punctuate", "true"),
                ("paragraphs", "true"),
                ("diarize", "true"),
                ("filler_words", "false"),
            ])
            .body(audio_bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OrdskifteError::Transcription(format!(
                "Transcription API returned {}: {}",
                status, body
            )));
        }

        let transcript: RawTranscript = response.json().await?;
        debug!("Received {} paragraphs", transcript.paragraphs().len());

        Ok(transcript)
    }
}
