//! Configuration module for Ordskifte.
//!
//! Handles loading and managing application settings. Provider secrets are
//! deliberately not part of the settings file; they come from the
//! environment and are checked by the CLI preflight.

mod settings;

pub use settings::{
    AudioSettings, DatabaseSettings, EmbeddingSettings, GeneralSettings, ProcessingSettings,
    RagSettings, Settings, TranscriptSettings, TranscriptionSettings,
};
