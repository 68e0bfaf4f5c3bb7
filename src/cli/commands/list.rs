//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::{EpisodeStore, SqliteStore};
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let store = SqliteStore::new(&settings.database_path())?;

    match store.list_episodes().await {
        Ok(episodes) => {
            if episodes.is_empty() {
                Output::info(
                    "No episodes in the database yet. Use 'ordskifte seed <file>' to add some.",
                );
            } else {
                Output::header(&format!("Episodes ({})", episodes.len()));
                println!();

                for episode in &episodes {
                    Output::episode_info(
                        episode.episode_number,
                        &episode.title,
                        episode.is_processed,
                        episode.segment_count,
                    );
                }

                let processed = episodes.iter().filter(|e| e.is_processed).count();
                let total_segments: i64 = episodes.iter().map(|e| e.segment_count).sum();
                println!();
                Output::kv("Processed", &format!("{}/{}", processed, episodes.len()));
                Output::kv("Total segments", &total_segments.to_string());
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to list episodes: {}", e));
            Err(e.into())
        }
    }
}
