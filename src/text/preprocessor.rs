//! Filler-word removal and punctuation repair ahead of embedding.

use super::TextNormalizer;
use regex::Regex;

/// Cleaned text shorter than this is treated as an artifact and dropped.
const MIN_CLEANED_CHARS: usize = 3;

/// Strips hesitations, discourse markers, and stage directions from speaker
/// text, then repairs the punctuation left behind.
#[derive(Debug, Clone)]
pub struct TextPreprocessor {
    hesitations: Regex,
    discourse_markers: Regex,
    brackets: Regex,
    double_comma: Regex,
    comma_before_period: Regex,
    comma_after_period: Regex,
    trailing_comma: Regex,
    leading_comma: Regex,
    repeated_terminal: Regex,
    repeated_comma: Regex,
    normalizer: TextNormalizer,
}

impl TextPreprocessor {
    /// Create a preprocessor with its pattern set compiled once.
    pub fn new() -> Self {
        Self {
            hesitations: Regex::new(r"(?i)\b(?:um|uh|like|you know|i mean|sort of|kind of)\b")
                .expect("valid hesitation pattern"),
            // Discourse markers only count when another word follows; the
            // capture re-emits that word's first character since the regex
            // crate has no lookahead.
            discourse_markers: Regex::new(r"(?i)\b(?:so|well|right|okay)\b(\s+\w)")
                .expect("valid discourse marker pattern"),
            brackets: Regex::new(r"\[[^\]]*\]").expect("valid bracket pattern"),
            double_comma: Regex::new(r",\s*,").expect("valid double comma pattern"),
            comma_before_period: Regex::new(r",\s*\.").expect("valid comma-period pattern"),
            comma_after_period: Regex::new(r"\.\s*,").expect("valid period-comma pattern"),
            trailing_comma: Regex::new(r",\s*$").expect("valid trailing comma pattern"),
            leading_comma: Regex::new(r"^\s*,").expect("valid leading comma pattern"),
            repeated_terminal: Regex::new(r"[.!?]{2,}").expect("valid repeated terminal pattern"),
            repeated_comma: Regex::new(r",{2,}").expect("valid repeated comma pattern"),
            normalizer: TextNormalizer::new(),
        }
    }

    /// Clean speaker text for embedding. Returns an empty string when the
    /// result is too short to be worth keeping; callers drop such segments.
    pub fn clean(&self, text: &str) -> String {
        let text = self.hesitations.replace_all(text, "");
        let text = self.strip_discourse_markers(&text);
        let text = self.brackets.replace_all(&text, "");

        let text = self.fix_punctuation_artifacts(&text);

        // Collapse runs of punctuation (this also flattens ellipses, which
        // carry no weight for embeddings).
        let text = self.repeated_terminal.replace_all(&text, ".");
        let text = self.repeated_comma.replace_all(&text, ",");

        let text = self.normalizer.normalize(&text);

        if text.trim().chars().count() < MIN_CLEANED_CHARS {
            String::new()
        } else {
            text
        }
    }

    /// Remove sentence-initial discourse markers. The consuming capture can
    /// hide a marker that immediately follows another, so iterate until the
    /// text is stable.
    fn strip_discourse_markers(&self, text: &str) -> String {
        let mut current = text.to_string();
        loop {
            let stripped = self
                .discourse_markers
                .replace_all(&current, "$1")
                .into_owned();
            if stripped == current {
                return current;
            }
            current = stripped;
        }
    }

    /// Repair comma/period artifacts left where filler words were removed.
    fn fix_punctuation_artifacts(&self, text: &str) -> String {
        let text = self.double_comma.replace_all(text, ",");
        let text = self.comma_before_period.replace_all(&text, ".");
        let text = self.comma_after_period.replace_all(&text, ".");
        let text = self.trailing_comma.replace_all(&text, "");
        let text = self.leading_comma.replace_all(&text, "");
        text.into_owned()
    }
}

impl Default for TextPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_hesitations() {
        let preprocessor = TextPreprocessor::new();
        assert_eq!(
            preprocessor.clean("I was, um, thinking about it"),
            "I was, thinking about it"
        );
        assert_eq!(
            preprocessor.clean("It was sort of a disaster"),
            "It was a disaster"
        );
    }

    #[test]
    fn test_filler_only_input_is_dropped() {
        let preprocessor = TextPreprocessor::new();
        assert_eq!(preprocessor.clean("um uh like"), "");
        assert_eq!(preprocessor.clean("uh, um..."), "");
    }

    #[test]
    fn test_removes_bracketed_stage_directions() {
        let preprocessor = TextPreprocessor::new();
        assert_eq!(
            preprocessor.clean("That was absurd [laughs] honestly"),
            "That was absurd honestly"
        );
    }

    #[test]
    fn test_strips_discourse_markers_before_words() {
        let preprocessor = TextPreprocessor::new();
        assert_eq!(
            preprocessor.clean("Well here is the thing"),
            "here is the thing"
        );
        // Stacked markers need the fixpoint pass.
        assert_eq!(
            preprocessor.clean("So well anyway it happened"),
            "anyway it happened"
        );
    }

    #[test]
    fn test_marker_without_following_word_survives() {
        let preprocessor = TextPreprocessor::new();
        assert_eq!(preprocessor.clean("That seems right."), "That seems right.");
    }

    #[test]
    fn test_repairs_punctuation_artifacts() {
        let preprocessor = TextPreprocessor::new();
        assert_eq!(preprocessor.clean("Yes, um, exactly."), "Yes, exactly.");
        assert_eq!(preprocessor.clean("Sure, um."), "Sure.");
    }

    #[test]
    fn test_collapses_repeated_punctuation() {
        let preprocessor = TextPreprocessor::new();
        assert_eq!(preprocessor.clean("What?!?! No way"), "What. No way");
    }

    #[test]
    fn test_short_artifact_is_dropped() {
        let preprocessor = TextPreprocessor::new();
        assert_eq!(preprocessor.clean("a."), "");
        assert_eq!(preprocessor.clean("  "), "");
    }
}
