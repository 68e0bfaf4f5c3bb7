//! Configuration settings for Ordskifte.

use crate::chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub database: DatabaseSettings,
    pub audio: AudioSettings,
    pub transcripts: TranscriptSettings,
    pub transcription: TranscriptionSettings,
    pub processing: ProcessingSettings,
    pub embedding: EmbeddingSettings,
    pub rag: RagSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.ordskifte".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Episode database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite database.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "~/.ordskifte/ordskifte.db".to_string(),
        }
    }
}

/// Audio input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Directory holding the episode audio files named in the database.
    pub input_dir: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            input_dir: "~/.ordskifte/audio".to_string(),
        }
    }
}

/// Transcript artifact directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Where raw provider responses are saved.
    pub raw_dir: String,
    /// Where formatted `{speaker, text}` exports are saved.
    pub formatted_dir: String,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            raw_dir: "~/.ordskifte/transcripts/raw".to_string(),
            formatted_dir: "~/.ordskifte/transcripts/formatted".to_string(),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Provider model to use.
    pub model: String,
    /// Spoken language hint.
    pub language: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "nova-3".to_string(),
            language: "en".to_string(),
        }
    }
}

/// Segment processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    /// Chunk window for long segments, in words.
    pub chunk_size: usize,
    /// Overlap between neighboring chunks, in words. Must stay below
    /// `chunk_size`.
    pub chunk_overlap: usize,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for answer generation.
    pub model: String,
    /// Number of segments retrieved as context.
    pub max_results: usize,
    /// Optional minimum similarity for search results.
    pub similarity_threshold: Option<f32>,
    /// Show name used in the analysis prompt.
    pub podcast_name: String,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_results: 5,
            similarity_threshold: None,
            podcast_name: "A Gentleman's Disagreement".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or the default location if None.
    /// A missing file yields the defaults.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::OrdskifteError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ordskifte")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded database path.
    pub fn database_path(&self) -> PathBuf {
        Self::expand_path(&self.database.path)
    }

    /// Get the expanded audio input directory.
    pub fn audio_dir(&self) -> PathBuf {
        Self::expand_path(&self.audio.input_dir)
    }

    /// Get the expanded raw transcript directory.
    pub fn raw_dir(&self) -> PathBuf {
        Self::expand_path(&self.transcripts.raw_dir)
    }

    /// Get the expanded formatted transcript directory.
    pub fn formatted_dir(&self) -> PathBuf {
        Self::expand_path(&self.transcripts.formatted_dir)
    }
}
