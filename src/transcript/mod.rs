//! Transcript data model and speaker-attributed segmentation.
//!
//! Mirrors the transcription provider's nested response shape and turns it
//! into speaker-attributed segments ready for cleanup and embedding.

mod export;
mod formatter;

pub use export::{export_segments, load_segments};
pub use formatter::TranscriptFormatter;

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Diarization label the provider assigns to one voice within an episode.
///
/// Labels are stringified small integers ("0", "1", ...) and are not a
/// stable identity across episodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SpeakerLabel(String);

impl SpeakerLabel {
    /// Create a label from its raw string form.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for SpeakerLabel {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for SpeakerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Providers are inconsistent about whether the label is a JSON number or a
// string; accept both.
impl<'de> Deserialize<'de> for SpeakerLabel {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => SpeakerLabel(n.to_string()),
            Raw::Text(s) => SpeakerLabel(s),
        })
    }
}

/// Closed per-episode mapping from diarization label to display name.
///
/// Built when an episode's work payload is constructed; the formatter drops
/// any paragraph whose label is missing here.
#[derive(Debug, Clone, Default)]
pub struct SpeakerMap {
    names: HashMap<SpeakerLabel, String>,
}

impl SpeakerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a label's display name.
    pub fn insert(&mut self, label: SpeakerLabel, name: impl Into<String>) {
        self.names.insert(label, name.into());
    }

    /// Resolve a label to its display name.
    pub fn resolve(&self, label: &SpeakerLabel) -> Option<&str> {
        self.names.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<K: Into<SpeakerLabel>, V: Into<String>> FromIterator<(K, V)> for SpeakerMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = SpeakerMap::new();
        for (label, name) in iter {
            map.insert(label.into(), name);
        }
        map
    }
}

/// Nested transcription response, exactly as the provider returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTranscript {
    pub results: TranscriptResults,
}

impl RawTranscript {
    /// Paragraphs of the first channel's best alternative, in temporal
    /// order. Empty when the response carries no diarized paragraphs.
    pub fn paragraphs(&self) -> &[Paragraph] {
        self.results
            .channels
            .first()
            .and_then(|channel| channel.alternatives.first())
            .and_then(|alternative| alternative.paragraphs.as_ref())
            .map(|group| group.paragraphs.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResults {
    #[serde(default)]
    pub channels: Vec<TranscriptChannel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptChannel {
    #[serde(default)]
    pub alternatives: Vec<TranscriptAlternative>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptAlternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraphs: Option<ParagraphGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParagraphGroup {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

/// One diarized paragraph: a speaker label and its sentences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub speaker: SpeakerLabel,
    #[serde(default)]
    pub sentences: Vec<Sentence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
}

/// A maximal run of consecutive paragraphs attributed to one speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSegment {
    pub speaker: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_label_accepts_number_or_string() {
        let from_number: SpeakerLabel = serde_json::from_str("0").unwrap();
        let from_string: SpeakerLabel = serde_json::from_str("\"0\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.as_str(), "0");
    }

    #[test]
    fn test_raw_transcript_paragraph_access() {
        let json = r#"{
            "results": {
                "channels": [{
                    "alternatives": [{
                        "transcript": "Hello there.",
                        "paragraphs": {
                            "paragraphs": [
                                {"speaker": "0", "sentences": [{"text": "Hello there."}]}
                            ]
                        }
                    }]
                }]
            }
        }"#;

        let transcript: RawTranscript = serde_json::from_str(json).unwrap();
        let paragraphs = transcript.paragraphs();
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].speaker.as_str(), "0");
        assert_eq!(paragraphs[0].sentences[0].text, "Hello there.");
    }

    #[test]
    fn test_missing_paragraphs_yields_empty_slice() {
        let json = r#"{"results": {"channels": [{"alternatives": [{"transcript": "x"}]}]}}"#;
        let transcript: RawTranscript = serde_json::from_str(json).unwrap();
        assert!(transcript.paragraphs().is_empty());
    }

    #[test]
    fn test_speaker_map_resolution() {
        let map: SpeakerMap = [(0i64, "Astrid Berg"), (1i64, "Johan Lind")]
            .into_iter()
            .collect();

        assert_eq!(map.resolve(&SpeakerLabel::new("0")), Some("Astrid Berg"));
        assert_eq!(map.resolve(&SpeakerLabel::new("2")), None);
        assert_eq!(map.len(), 2);
    }
}
