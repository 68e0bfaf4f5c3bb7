//! SQLite-backed episode store.
//!
//! Embeddings live in a BLOB column and cosine similarity is computed in
//! Rust, which is plenty for one podcast's worth of segments. A dedicated
//! vector extension only becomes interesting at much larger scale.

use super::{
    cosine_similarity, EmbeddingRecord, Episode, EpisodeInfo, EpisodeStore, SegmentMatch, WorkRow,
};
use crate::error::{OrdskifteError, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS episodes (
    episode_number INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    file_name TEXT NOT NULL,
    date_published TEXT,
    is_processed INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS speakers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS episode_speakers (
    episode_id INTEGER NOT NULL REFERENCES episodes(episode_number),
    speaker_number INTEGER NOT NULL,
    speaker_id INTEGER NOT NULL REFERENCES speakers(id),
    PRIMARY KEY (episode_id, speaker_number)
);

CREATE TABLE IF NOT EXISTS transcript_segments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    episode_id INTEGER NOT NULL REFERENCES episodes(episode_number),
    speaker_id INTEGER NOT NULL REFERENCES speakers(id),
    text TEXT NOT NULL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_segments_episode ON transcript_segments(episode_id);
"#;

/// SQLite-based episode store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened episode store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| OrdskifteError::Store(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to little-endian bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from little-endian bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }
}

#[async_trait]
impl EpisodeStore for SqliteStore {
    async fn validate_connection(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_unprocessed(&self) -> Result<Vec<WorkRow>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT e.episode_number,
                   e.file_name,
                   es.speaker_number,
                   s.name,
                   s.id
            FROM episodes AS e
            JOIN episode_speakers AS es
                ON es.episode_id = e.episode_number
            JOIN speakers AS s
                ON s.id = es.speaker_id
            WHERE e.is_processed = 0
            ORDER BY e.episode_number, es.speaker_number
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(WorkRow {
                episode_number: row.get(0)?,
                file_name: row.get(1)?,
                speaker_number: row.get(2)?,
                speaker_name: row.get(3)?,
                speaker_id: row.get(4)?,
            })
        })?;

        let result: Vec<WorkRow> = rows.collect::<std::result::Result<_, _>>()?;
        debug!("Fetched {} unprocessed work rows", result.len());
        Ok(result)
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn store_embeddings(
        &self,
        episode_number: i64,
        records: &[EmbeddingRecord],
    ) -> Result<usize> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        for record in records {
            let embedding_bytes = Self::embedding_to_bytes(&record.embedding);
            tx.execute(
                r#"
                INSERT INTO transcript_segments (episode_id, speaker_id, text, embedding)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![episode_number, record.speaker_id, record.text, embedding_bytes],
            )?;
        }

        tx.commit()?;
        info!(
            "Stored {} embeddings for episode {}",
            records.len(),
            episode_number
        );
        Ok(records.len())
    }

    #[instrument(skip(self))]
    async fn mark_processed(&self, episode_number: i64) -> Result<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            "UPDATE episodes SET is_processed = 1 WHERE episode_number = ?1",
            params![episode_number],
        )?;

        if updated == 0 {
            return Err(OrdskifteError::Store(format!(
                "No episode {} to mark processed",
                episode_number
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_similarity: Option<f32>,
    ) -> Result<Vec<SegmentMatch>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT s.name, t.text, t.embedding
            FROM transcript_segments AS t
            JOIN speakers AS s ON s.id = t.speaker_id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let speaker: String = row.get(0)?;
            let text: String = row.get(1)?;
            let embedding_bytes: Vec<u8> = row.get(2)?;
            Ok((speaker, text, Self::bytes_to_embedding(&embedding_bytes)))
        })?;

        let mut matches: Vec<SegmentMatch> = rows
            .filter_map(|r| r.ok())
            .map(|(speaker, text, embedding)| SegmentMatch {
                speaker,
                text,
                similarity: cosine_similarity(query_embedding, &embedding),
            })
            .filter(|m| min_similarity.map_or(true, |min| m.similarity > min))
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        debug!("Found {} matching segments", matches.len());
        Ok(matches)
    }

    #[instrument(skip(self))]
    async fn list_episodes(&self) -> Result<Vec<EpisodeInfo>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT e.episode_number, e.title, e.file_name, e.is_processed,
                   COUNT(t.id) AS segment_count
            FROM episodes AS e
            LEFT JOIN transcript_segments AS t
                ON t.episode_id = e.episode_number
            GROUP BY e.episode_number
            ORDER BY e.episode_number
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(EpisodeInfo {
                episode_number: row.get(0)?,
                title: row.get(1)?,
                file_name: row.get(2)?,
                is_processed: row.get::<_, i64>(3)? != 0,
                segment_count: row.get(4)?,
            })
        })?;

        let result: Vec<EpisodeInfo> = rows.collect::<std::result::Result<_, _>>()?;
        Ok(result)
    }

    async fn segment_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM transcript_segments", [], |row| {
                row.get(0)
            })?;
        Ok(count as usize)
    }
}

// Seeding and maintenance methods (not part of the EpisodeStore trait).
impl SqliteStore {
    /// Insert or update an episode, preserving its processed flag.
    pub fn upsert_episode(&self, episode: &Episode) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO episodes (episode_number, title, file_name, date_published, is_processed)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(episode_number) DO UPDATE SET
                title = excluded.title,
                file_name = excluded.file_name,
                date_published = excluded.date_published
            "#,
            params![
                episode.episode_number,
                episode.title,
                episode.file_name,
                episode.date_published.map(|d| d.to_string()),
                episode.is_processed as i64,
            ],
        )?;
        Ok(())
    }

    /// Look up a speaker by name, creating the row if needed.
    pub fn get_or_create_speaker(&self, name: &str) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT OR IGNORE INTO speakers (name) VALUES (?1)",
            params![name],
        )?;

        let id: i64 = conn.query_row(
            "SELECT id FROM speakers WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Assign a diarization number to a speaker for one episode.
    pub fn link_speaker(
        &self,
        episode_number: i64,
        speaker_number: i64,
        speaker_id: i64,
    ) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO episode_speakers (episode_id, speaker_number, speaker_id)
            VALUES (?1, ?2, ?3)
            "#,
            params![episode_number, speaker_number, speaker_id],
        )?;
        Ok(())
    }

    /// Drop all tables and recreate the schema. Deletes every row.
    pub fn reset(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS transcript_segments;
            DROP TABLE IF EXISTS episode_speakers;
            DROP TABLE IF EXISTS speakers;
            DROP TABLE IF EXISTS episodes;
            "#,
        )?;
        conn.execute_batch(SCHEMA)?;

        info!("Reset episode store schema");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();

        store
            .upsert_episode(&Episode {
                episode_number: 180,
                title: "On Disagreement".to_string(),
                file_name: "ep-180.mp3".to_string(),
                date_published: None,
                is_processed: false,
            })
            .unwrap();

        let a = store.get_or_create_speaker("Astrid Berg").unwrap();
        let b = store.get_or_create_speaker("Johan Lind").unwrap();
        store.link_speaker(180, 0, a).unwrap();
        store.link_speaker(180, 1, b).unwrap();

        store
    }

    #[tokio::test]
    async fn test_fetch_unprocessed_rows_ordered_by_speaker() {
        let store = seeded_store();

        let rows = store.fetch_unprocessed().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].episode_number, 180);
        assert_eq!(rows[0].speaker_number, 0);
        assert_eq!(rows[0].speaker_name, "Astrid Berg");
        assert_eq!(rows[1].speaker_number, 1);
        assert_eq!(rows[1].speaker_name, "Johan Lind");
    }

    #[tokio::test]
    async fn test_processed_episodes_are_excluded_from_work() {
        let store = seeded_store();

        store.mark_processed(180).await.unwrap();
        let rows = store.fetch_unprocessed().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_store_embeddings_and_search() {
        let store = seeded_store();
        let speaker_id = store.get_or_create_speaker("Astrid Berg").unwrap();

        let records = vec![
            EmbeddingRecord {
                speaker_id,
                text: "about taxes".to_string(),
                embedding: vec![1.0, 0.0, 0.0],
            },
            EmbeddingRecord {
                speaker_id,
                text: "about music".to_string(),
                embedding: vec![0.0, 1.0, 0.0],
            },
        ];

        let stored = store.store_embeddings(180, &records).await.unwrap();
        assert_eq!(stored, 2);
        assert_eq!(store.segment_count().await.unwrap(), 2);

        let matches = store.search(&[1.0, 0.0, 0.0], 5, None).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].text, "about taxes");
        assert!((matches[0].similarity - 1.0).abs() < 0.001);
        assert_eq!(matches[0].speaker, "Astrid Berg");

        // A threshold drops the orthogonal segment.
        let matches = store.search(&[1.0, 0.0, 0.0], 5, Some(0.5)).await.unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn test_list_episodes_reports_counts() {
        let store = seeded_store();
        let speaker_id = store.get_or_create_speaker("Astrid Berg").unwrap();

        store
            .store_embeddings(
                180,
                &[EmbeddingRecord {
                    speaker_id,
                    text: "one".to_string(),
                    embedding: vec![0.5, 0.5],
                }],
            )
            .await
            .unwrap();

        let episodes = store.list_episodes().await.unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].segment_count, 1);
        assert!(!episodes[0].is_processed);
    }

    #[tokio::test]
    async fn test_mark_processed_requires_existing_episode() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.mark_processed(999).await.is_err());
    }

    #[tokio::test]
    async fn test_reset_clears_all_rows() {
        let store = seeded_store();
        store.reset().unwrap();

        assert!(store.fetch_unprocessed().await.unwrap().is_empty());
        assert_eq!(store.segment_count().await.unwrap(), 0);
    }
}
