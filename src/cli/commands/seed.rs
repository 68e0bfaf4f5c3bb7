//! Seed command implementation.
//!
//! Loads episodes and their per-episode speaker assignments from a TOML
//! file into the database. Example file:
//!
//! ```toml
//! [[episodes]]
//! number = 180
//! title = "On Disagreement"
//! file_name = "agd-180.mp3"
//! date_published = "2024-05-01"
//!
//! [episodes.speakers]
//! 0 = "Ricky Ghoshroy"
//! 1 = "Brendan Kelly"
//! ```

use crate::cli::Output;
use crate::config::Settings;
use crate::error::OrdskifteError;
use crate::store::{Episode, SqliteStore};
use anyhow::Result;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SeedFile {
    episodes: Vec<SeedEpisode>,
}

#[derive(Debug, Deserialize)]
struct SeedEpisode {
    number: i64,
    title: String,
    file_name: String,
    #[serde(default)]
    date_published: Option<NaiveDate>,
    /// Diarization label (as TOML key) to display name.
    speakers: BTreeMap<String, String>,
}

/// Run the seed command.
pub async fn run_seed(file: &str, reset: bool, settings: Settings) -> Result<()> {
    let content = std::fs::read_to_string(Path::new(file))?;
    let seed: SeedFile = toml::from_str(&content)?;

    let store = SqliteStore::new(&settings.database_path())?;

    if reset {
        Output::warning("Resetting database: all stored segments will be deleted.");
        store.reset()?;
    }

    let mut speaker_links = 0usize;
    for entry in &seed.episodes {
        store.upsert_episode(&Episode {
            episode_number: entry.number,
            title: entry.title.clone(),
            file_name: entry.file_name.clone(),
            date_published: entry.date_published,
            is_processed: false,
        })?;

        for (label, name) in &entry.speakers {
            let speaker_number: i64 = label.parse().map_err(|_| {
                OrdskifteError::InvalidInput(format!(
                    "Episode {}: speaker label '{}' is not a number",
                    entry.number, label
                ))
            })?;

            let speaker_id = store.get_or_create_speaker(name)?;
            store.link_speaker(entry.number, speaker_number, speaker_id)?;
            speaker_links += 1;
        }
    }

    Output::success(&format!(
        "Seeded {} episode(s) with {} speaker assignment(s)",
        seed.episodes.len(),
        speaker_links
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_file_parses() {
        let seed: SeedFile = toml::from_str(
            r#"
            [[episodes]]
            number = 180
            title = "On Disagreement"
            file_name = "agd-180.mp3"
            date_published = "2024-05-01"

            [episodes.speakers]
            0 = "Ricky Ghoshroy"
            1 = "Brendan Kelly"
            "#,
        )
        .unwrap();

        assert_eq!(seed.episodes.len(), 1);
        let episode = &seed.episodes[0];
        assert_eq!(episode.number, 180);
        assert_eq!(episode.speakers.len(), 2);
        assert_eq!(episode.speakers.get("0").unwrap(), "Ricky Ghoshroy");
        assert_eq!(
            episode.date_published,
            Some(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        );
    }
}
