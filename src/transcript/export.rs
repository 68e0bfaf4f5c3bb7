//! Formatted-segment JSON artifacts.
//!
//! The exported file is the hand-off point between the formatting and
//! embedding stages; it survives a process restart, so an interrupted run
//! can be resumed without re-transcribing.

use super::SpeakerSegment;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write segments as a JSON array of `{speaker, text}` objects, named after
/// the source transcript's base name. Returns the path written.
pub fn export_segments(
    segments: &[SpeakerSegment],
    output_dir: &Path,
    base_name: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let path = output_dir.join(format!("{}.json", base_name));
    let json = serde_json::to_string_pretty(segments)?;
    fs::write(&path, json)?;

    debug!("Exported {} segments to {:?}", segments.len(), path);
    Ok(path)
}

/// Load previously exported segments.
pub fn load_segments(path: &Path) -> Result<Vec<SpeakerSegment>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let segments = vec![
            SpeakerSegment {
                speaker: "A".to_string(),
                text: "First thought.".to_string(),
            },
            SpeakerSegment {
                speaker: "B".to_string(),
                text: "A reply.".to_string(),
            },
        ];

        let path = export_segments(&segments, dir.path(), "episode-042").unwrap();
        assert_eq!(path.file_name().unwrap(), "episode-042.json");

        let loaded = load_segments(&path).unwrap();
        assert_eq!(loaded, segments);
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(load_segments(Path::new("/nonexistent/episode.json")).is_err());
    }
}
