//! Whitespace and punctuation spacing normalization.

use regex::Regex;

/// Stand-in for ellipses while terminal punctuation spacing is enforced.
/// A private-use codepoint, so it cannot collide with transcript text.
const ELLIPSIS_MASK: &str = "\u{e000}";

/// Normalizes spacing so text reads consistently after merging and cleanup.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    whitespace: Regex,
    ellipsis: Regex,
    terminal: Regex,
}

impl TextNormalizer {
    /// Create a normalizer with its patterns compiled once.
    pub fn new() -> Self {
        Self {
            whitespace: Regex::new(r"\s+").expect("valid whitespace pattern"),
            ellipsis: Regex::new(r"\.{3,}").expect("valid ellipsis pattern"),
            terminal: Regex::new(r"([.!?])\s*").expect("valid terminal pattern"),
        }
    }

    /// Collapse whitespace runs to single spaces and enforce exactly one
    /// space after `.`, `!`, and `?`, leaving ellipses intact.
    ///
    /// Total over strings and idempotent.
    pub fn normalize(&self, text: &str) -> String {
        let text = self.whitespace.replace_all(text, " ");

        // Mask ellipses so the terminal-punctuation rule cannot split them.
        let text = self.ellipsis.replace_all(&text, ELLIPSIS_MASK);
        let text = self.terminal.replace_all(&text, "$1 ");
        let text = text.replace(ELLIPSIS_MASK, "...");

        text.trim().to_string()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_runs() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("hello   world"), "hello world");
        assert_eq!(normalizer.normalize("hello\t\n world"), "hello world");
    }

    #[test]
    fn test_single_space_after_terminal_punctuation() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("Yes.No"), "Yes. No");
        assert_eq!(normalizer.normalize("Really?!Sure"), "Really? ! Sure");
        assert_eq!(normalizer.normalize("Done.   Next"), "Done. Next");
    }

    #[test]
    fn test_protects_ellipses() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("Wait... what"), "Wait... what");
        assert_eq!(normalizer.normalize("Hmm.... okay"), "Hmm... okay");
    }

    #[test]
    fn test_trims_edges() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("  padded  "), "padded");
        assert_eq!(normalizer.normalize("Done. "), "Done.");
    }

    #[test]
    fn test_idempotent() {
        let normalizer = TextNormalizer::new();
        for input in [
            "Yes.No",
            "Wait... what",
            "  a  lot   of\tspace ",
            "Really?!Sure",
            "",
        ] {
            let once = normalizer.normalize(input);
            assert_eq!(normalizer.normalize(&once), once, "input: {:?}", input);
        }
    }
}
