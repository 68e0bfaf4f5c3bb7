//! Speaker-run merging over the provider's paragraph tree.

use super::{RawTranscript, SpeakerMap, SpeakerSegment};
use crate::text::TextNormalizer;
use tracing::warn;

/// Merges consecutive same-speaker paragraphs into speaker segments.
#[derive(Debug, Clone)]
pub struct TranscriptFormatter {
    normalizer: TextNormalizer,
}

impl TranscriptFormatter {
    pub fn new() -> Self {
        Self {
            normalizer: TextNormalizer::new(),
        }
    }

    /// Walk paragraphs in order and emit one segment per maximal run of
    /// consecutive paragraphs with the same resolved speaker.
    ///
    /// Non-adjacent runs of the same speaker stay separate. Paragraphs whose
    /// label is not in `speakers` are dropped (and counted in a warning);
    /// the run around a dropped paragraph is merged as if it were absent.
    pub fn format(&self, transcript: &RawTranscript, speakers: &SpeakerMap) -> Vec<SpeakerSegment> {
        let mut segments = Vec::new();
        let mut current: Option<(String, Vec<String>)> = None;
        let mut unresolved = 0usize;

        for paragraph in transcript.paragraphs() {
            let Some(name) = speakers.resolve(&paragraph.speaker) else {
                unresolved += 1;
                continue;
            };

            let sentences = paragraph.sentences.iter().map(|s| s.text.clone());

            match &mut current {
                Some((speaker, texts)) if speaker.as_str() == name => {
                    texts.extend(sentences);
                }
                _ => {
                    if let Some(run) = current.take() {
                        self.flush(run, &mut segments);
                    }
                    current = Some((name.to_string(), sentences.collect()));
                }
            }
        }

        if let Some(run) = current.take() {
            self.flush(run, &mut segments);
        }

        if unresolved > 0 {
            warn!(
                "Dropped {} paragraph(s) with speaker labels missing from the episode map",
                unresolved
            );
        }

        segments
    }

    /// Emit a finished run, skipping runs that normalize to nothing.
    fn flush(&self, (speaker, texts): (String, Vec<String>), segments: &mut Vec<SpeakerSegment>) {
        let text = self.normalizer.normalize(&texts.join(" "));
        if !text.is_empty() {
            segments.push(SpeakerSegment { speaker, text });
        }
    }
}

impl Default for TranscriptFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transcript(paragraphs: serde_json::Value) -> RawTranscript {
        serde_json::from_value(json!({
            "results": {
                "channels": [{
                    "alternatives": [{
                        "transcript": "",
                        "paragraphs": {"paragraphs": paragraphs}
                    }]
                }]
            }
        }))
        .unwrap()
    }

    fn two_speaker_map() -> SpeakerMap {
        [(0i64, "A"), (1i64, "B")].into_iter().collect()
    }

    #[test]
    fn test_merges_consecutive_same_speaker_paragraphs() {
        let transcript = transcript(json!([
            {"speaker": "0", "sentences": [{"text": "Hi."}]},
            {"speaker": "0", "sentences": [{"text": "Again."}]},
            {"speaker": "1", "sentences": [{"text": "Hello."}]}
        ]));

        let segments = TranscriptFormatter::new().format(&transcript, &two_speaker_map());

        assert_eq!(
            segments,
            vec![
                SpeakerSegment {
                    speaker: "A".to_string(),
                    text: "Hi. Again.".to_string()
                },
                SpeakerSegment {
                    speaker: "B".to_string(),
                    text: "Hello.".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_no_adjacent_segments_share_a_speaker() {
        let transcript = transcript(json!([
            {"speaker": 0, "sentences": [{"text": "One."}]},
            {"speaker": 1, "sentences": [{"text": "Two."}]},
            {"speaker": 1, "sentences": [{"text": "Three."}]},
            {"speaker": 0, "sentences": [{"text": "Four."}]},
            {"speaker": 0, "sentences": [{"text": "Five."}]},
            {"speaker": 1, "sentences": [{"text": "Six."}]}
        ]));

        let segments = TranscriptFormatter::new().format(&transcript, &two_speaker_map());

        assert_eq!(segments.len(), 4);
        for pair in segments.windows(2) {
            assert_ne!(pair[0].speaker, pair[1].speaker);
        }
        // Non-adjacent runs of speaker A stay separate.
        assert_eq!(segments[0].speaker, "A");
        assert_eq!(segments[2].speaker, "A");
    }

    #[test]
    fn test_joins_sentences_within_a_paragraph() {
        let transcript = transcript(json!([
            {"speaker": "0", "sentences": [
                {"text": "First sentence."},
                {"text": "Second sentence."}
            ]}
        ]));

        let segments = TranscriptFormatter::new().format(&transcript, &two_speaker_map());

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "First sentence. Second sentence.");
    }

    #[test]
    fn test_unmapped_speaker_paragraphs_are_dropped() {
        let transcript = transcript(json!([
            {"speaker": "0", "sentences": [{"text": "Kept."}]},
            {"speaker": "7", "sentences": [{"text": "Dropped."}]},
            {"speaker": "0", "sentences": [{"text": "Also kept."}]}
        ]));

        let segments = TranscriptFormatter::new().format(&transcript, &two_speaker_map());

        // The dropped paragraph does not split speaker A's run.
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Kept. Also kept.");
    }

    #[test]
    fn test_empty_paragraphs_emit_nothing() {
        let transcript = transcript(json!([
            {"speaker": "0", "sentences": []}
        ]));

        let segments = TranscriptFormatter::new().format(&transcript, &two_speaker_map());
        assert!(segments.is_empty());
    }

    #[test]
    fn test_segment_count_bounded_by_paragraph_count() {
        let transcript = transcript(json!([
            {"speaker": "0", "sentences": [{"text": "A."}]},
            {"speaker": "1", "sentences": [{"text": "B."}]},
            {"speaker": "0", "sentences": [{"text": "C."}]}
        ]));

        let segments = TranscriptFormatter::new().format(&transcript, &two_speaker_map());
        assert!(segments.len() <= 3);
    }
}
