//! Pipeline orchestration.
//!
//! Coordinates transcription, formatting, export, embedding, and storage for
//! every unprocessed episode. Episodes run strictly one after another; a
//! stage failure skips that episode and the run continues, and the episode's
//! processed flag stays unset so the next run retries it.

use crate::chunking::TextChunker;
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{OrdskifteError, Result};
use crate::segments::SegmentProcessor;
use crate::store::{EmbeddingRecord, EpisodeStore, SqliteStore, WorkRow};
use crate::transcript::{
    export_segments, load_segments, RawTranscript, SpeakerMap, TranscriptFormatter,
};
use crate::transcription::{DeepgramTranscriber, Transcriber};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcribe,
    Format,
    Embed,
    Store,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Transcribe => "transcription",
            Stage::Format => "formatting",
            Stage::Embed => "embedding",
            Stage::Store => "storage",
        };
        write!(f, "{}", name)
    }
}

/// Terminal state of one episode's pipeline run.
#[derive(Debug)]
pub enum EpisodeOutcome {
    /// Embeddings persisted and the episode marked processed.
    Processed { segments: usize },
    /// Nothing embeddable was produced; the episode stays unprocessed.
    Skipped { reason: String },
    /// A stage failed; the episode stays unprocessed for a later retry.
    Failed { stage: Stage, error: OrdskifteError },
}

/// One episode's work payload, regrouped from flat store rows.
#[derive(Debug, Clone)]
pub struct EpisodeJob {
    pub episode_number: i64,
    pub file_name: String,
    /// Diarization label -> display name, for the formatter.
    pub speakers: SpeakerMap,
    /// Display name -> speaker row id, for persistence.
    pub speaker_ids: HashMap<String, i64>,
}

/// Counts for a full pipeline run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Group flat (episode, speaker) rows into one job per episode.
///
/// Rows arrive ordered by episode then speaker number, so a job is complete
/// once the episode number changes.
pub fn group_into_jobs(rows: Vec<WorkRow>) -> Vec<EpisodeJob> {
    let mut jobs: Vec<EpisodeJob> = Vec::new();

    for row in rows {
        match jobs.last_mut() {
            Some(job) if job.episode_number == row.episode_number => {
                job.speakers
                    .insert(row.speaker_number.into(), &row.speaker_name);
                job.speaker_ids.insert(row.speaker_name, row.speaker_id);
            }
            _ => {
                let mut speakers = SpeakerMap::new();
                speakers.insert(row.speaker_number.into(), &row.speaker_name);
                let mut speaker_ids = HashMap::new();
                speaker_ids.insert(row.speaker_name, row.speaker_id);

                jobs.push(EpisodeJob {
                    episode_number: row.episode_number,
                    file_name: row.file_name,
                    speakers,
                    speaker_ids,
                });
            }
        }
    }

    jobs
}

/// The main orchestrator for the Ordskifte pipeline.
pub struct Pipeline {
    settings: Settings,
    transcriber: Arc<dyn Transcriber>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn EpisodeStore>,
    formatter: TranscriptFormatter,
    processor: SegmentProcessor,
}

impl Pipeline {
    /// Create a pipeline with the default providers and store.
    pub fn new(settings: Settings) -> Result<Self> {
        let transcriber: Arc<dyn Transcriber> = Arc::new(DeepgramTranscriber::new(
            &settings.transcription.model,
            &settings.transcription.language,
        )?);

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let store: Arc<dyn EpisodeStore> = Arc::new(SqliteStore::new(&settings.database_path())?);

        Self::with_components(settings, transcriber, embedder, store)
    }

    /// Create a pipeline for offline work (the `format` path), where no
    /// transcription provider is needed and no provider key may be present.
    pub fn new_offline(settings: Settings) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let store: Arc<dyn EpisodeStore> = Arc::new(SqliteStore::new(&settings.database_path())?);

        Self::with_components(settings, Arc::new(OfflineTranscriber), embedder, store)
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        transcriber: Arc<dyn Transcriber>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn EpisodeStore>,
    ) -> Result<Self> {
        let chunker = TextChunker::new(
            settings.processing.chunk_size,
            settings.processing.chunk_overlap,
        )?;

        Ok(Self {
            settings,
            transcriber,
            embedder,
            store,
            formatter: TranscriptFormatter::new(),
            processor: SegmentProcessor::with_chunker(chunker),
        })
    }

    /// Run the full pipeline over every unprocessed episode.
    ///
    /// An unreachable store is fatal; everything after that is per-episode.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunSummary> {
        self.store.validate_connection().await.map_err(|e| {
            OrdskifteError::Store(format!(
                "Database connection failed; run 'ordskifte seed' first: {}",
                e
            ))
        })?;

        let rows = self.store.fetch_unprocessed().await?;
        let jobs = group_into_jobs(rows);

        if jobs.is_empty() {
            info!("No unprocessed episodes found");
            eprintln!("Nothing to do: every episode is already processed.");
            return Ok(RunSummary::default());
        }

        info!("Processing {} episode(s)", jobs.len());

        let mut summary = RunSummary::default();
        for job in &jobs {
            eprintln!("Episode {}:", job.episode_number);
            let outcome = self.process_episode(job).await;
            self.tally(job, outcome, &mut summary);
        }

        Ok(summary)
    }

    /// Re-format previously saved raw transcripts without re-transcribing.
    /// Episodes whose raw transcript is missing are skipped.
    #[instrument(skip(self))]
    pub async fn format_existing(&self) -> Result<RunSummary> {
        self.store.validate_connection().await?;

        let jobs = group_into_jobs(self.store.fetch_unprocessed().await?);
        let mut summary = RunSummary::default();

        for job in &jobs {
            let base_name = file_stem(&job.file_name);
            let raw_path = self.settings.raw_dir().join(format!("{}.json", base_name));

            if !raw_path.exists() {
                summary.skipped += 1;
                eprintln!(
                    "Episode {}: skipped (no raw transcript at {:?})",
                    job.episode_number, raw_path
                );
                continue;
            }

            let outcome = match self.load_raw_transcript(&raw_path) {
                Ok(transcript) => match self.format_and_export(&transcript, job, &base_name) {
                    Ok(path) => {
                        eprintln!(
                            "Episode {}: formatted transcript written to {:?}",
                            job.episode_number, path
                        );
                        summary.processed += 1;
                        continue;
                    }
                    Err(error) => EpisodeOutcome::Failed {
                        stage: Stage::Format,
                        error,
                    },
                },
                Err(error) => EpisodeOutcome::Failed {
                    stage: Stage::Format,
                    error,
                },
            };

            self.tally(job, outcome, &mut summary);
        }

        Ok(summary)
    }

    /// Run a single episode through all stages, reporting how it ended.
    ///
    /// Side effects accumulate per stage and are not rolled back; a re-run
    /// is safe because the processed flag only flips at the very end.
    async fn process_episode(&self, job: &EpisodeJob) -> EpisodeOutcome {
        // Transcribe
        eprintln!("  Transcribing {}...", job.file_name);
        let audio_path = self.settings.audio_dir().join(&job.file_name);
        let transcript = match self.transcriber.transcribe(&audio_path).await {
            Ok(transcript) => transcript,
            Err(error) => {
                return EpisodeOutcome::Failed {
                    stage: Stage::Transcribe,
                    error,
                }
            }
        };

        let base_name = file_stem(&job.file_name);
        if let Err(e) = self.save_raw_transcript(&transcript, &base_name) {
            // The raw artifact only feeds the re-format path; losing it does
            // not invalidate this run.
            warn!("Failed to save raw transcript: {}", e);
        }

        // Format + export
        eprintln!("  Formatting transcript...");
        let exported = match self.format_and_export(&transcript, job, &base_name) {
            Ok(path) => path,
            Err(error) => {
                return EpisodeOutcome::Failed {
                    stage: Stage::Format,
                    error,
                }
            }
        };

        // Reload from the exported artifact: the file is the hand-off point
        // between the formatting and embedding stages.
        let formatted = match load_segments(&exported) {
            Ok(segments) => segments,
            Err(error) => {
                return EpisodeOutcome::Failed {
                    stage: Stage::Format,
                    error,
                }
            }
        };
        if formatted.is_empty() {
            return EpisodeOutcome::Skipped {
                reason: "no speaker segments after formatting".to_string(),
            };
        }

        let processed = self.processor.process(&formatted);
        if processed.is_empty() {
            return EpisodeOutcome::Skipped {
                reason: "no segments survived cleaning".to_string(),
            };
        }

        // Embed (one batched provider call per episode)
        eprintln!("  Generating embeddings for {} segments...", processed.len());
        let texts: Vec<String> = processed.iter().map(|s| s.text.clone()).collect();
        let embeddings = match self.embedder.embed_batch(&texts).await {
            Ok(embeddings) => embeddings,
            Err(error) => {
                return EpisodeOutcome::Failed {
                    stage: Stage::Embed,
                    error,
                }
            }
        };
        if embeddings.len() != processed.len() {
            return EpisodeOutcome::Failed {
                stage: Stage::Embed,
                error: OrdskifteError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    processed.len(),
                    embeddings.len()
                )),
            };
        }

        // Resolve speaker names to row ids; segments with no id are dropped.
        let mut records = Vec::with_capacity(processed.len());
        let mut unresolved: BTreeSet<String> = BTreeSet::new();
        for (segment, embedding) in processed.iter().zip(embeddings) {
            match job.speaker_ids.get(&segment.speaker) {
                Some(&speaker_id) => records.push(EmbeddingRecord {
                    speaker_id,
                    text: segment.text.clone(),
                    embedding,
                }),
                None => {
                    unresolved.insert(segment.speaker.clone());
                }
            }
        }
        if !unresolved.is_empty() {
            let names: Vec<String> = unresolved.into_iter().collect();
            warn!(
                "Dropped segments for speaker(s) with no database id: {}",
                names.join(", ")
            );
        }
        if records.is_empty() {
            return EpisodeOutcome::Skipped {
                reason: "no embeddings left after speaker resolution".to_string(),
            };
        }

        // Store
        eprintln!("  Storing {} embeddings...", records.len());
        let stored = match self.store.store_embeddings(job.episode_number, &records).await {
            Ok(count) => count,
            Err(error) => {
                return EpisodeOutcome::Failed {
                    stage: Stage::Store,
                    error,
                }
            }
        };

        if let Err(error) = self.store.mark_processed(job.episode_number).await {
            return EpisodeOutcome::Failed {
                stage: Stage::Store,
                error,
            };
        }

        EpisodeOutcome::Processed { segments: stored }
    }

    /// Format a transcript and write the `{speaker, text}` JSON artifact.
    fn format_and_export(
        &self,
        transcript: &RawTranscript,
        job: &EpisodeJob,
        base_name: &str,
    ) -> Result<std::path::PathBuf> {
        let formatted = self.formatter.format(transcript, &job.speakers);
        let path = export_segments(&formatted, &self.settings.formatted_dir(), base_name)?;
        info!("Exported formatted transcript to {:?}", path);
        Ok(path)
    }

    /// Persist the provider's raw response beside the formatted export so
    /// `format` can re-run without re-transcribing.
    fn save_raw_transcript(&self, transcript: &RawTranscript, base_name: &str) -> Result<()> {
        let dir = self.settings.raw_dir();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.json", base_name));
        let json = serde_json::to_string_pretty(transcript)?;
        std::fs::write(&path, json)?;
        Ok(())
    }

    fn load_raw_transcript(&self, path: &Path) -> Result<RawTranscript> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Fold one episode's outcome into the run summary, with user-facing
    /// progress markers.
    fn tally(&self, job: &EpisodeJob, outcome: EpisodeOutcome, summary: &mut RunSummary) {
        match outcome {
            EpisodeOutcome::Processed { segments } => {
                summary.processed += 1;
                eprintln!("  Done ({} segments stored)", segments);
            }
            EpisodeOutcome::Skipped { reason } => {
                summary.skipped += 1;
                warn!("Episode {} skipped: {}", job.episode_number, reason);
                eprintln!("  Skipped: {}", reason);
            }
            EpisodeOutcome::Failed { stage, error } => {
                summary.failed += 1;
                warn!(
                    "Episode {} failed during {}: {}",
                    job.episode_number, stage, error
                );
                eprintln!("  Skipped after {} failure: {}", stage, error);
            }
        }
    }
}

/// Transcriber for offline pipelines; reaching it is a usage error.
struct OfflineTranscriber;

#[async_trait::async_trait]
impl Transcriber for OfflineTranscriber {
    async fn transcribe(&self, _audio_path: &Path) -> Result<RawTranscript> {
        Err(OrdskifteError::Transcription(
            "Transcription is not available in offline mode".to_string(),
        ))
    }
}

/// Base name of an audio file, used to name its transcript artifacts.
fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Episode;
    use async_trait::async_trait;
    use serde_json::json;

    struct StubTranscriber {
        result: std::result::Result<serde_json::Value, String>,
    }

    #[async_trait]
    impl Transcriber for StubTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<RawTranscript> {
            match &self.result {
                Ok(value) => Ok(serde_json::from_value(value.clone())?),
                Err(message) => Err(OrdskifteError::Transcription(message.clone())),
            }
        }
    }

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn sample_transcript() -> serde_json::Value {
        json!({
            "results": {
                "channels": [{
                    "alternatives": [{
                        "transcript": "",
                        "paragraphs": {
                            "paragraphs": [
                                {"speaker": "0", "sentences": [
                                    {"text": "Welcome back to the show."},
                                    {"text": "We have plenty to argue about today."}
                                ]},
                                {"speaker": "1", "sentences": [
                                    {"text": "I already disagree with the premise."}
                                ]}
                            ]
                        }
                    }]
                }]
            }
        })
    }

    fn seeded_store() -> Arc<SqliteStore> {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_episode(&Episode {
                episode_number: 180,
                title: "On Premises".to_string(),
                file_name: "ep-180.mp3".to_string(),
                date_published: None,
                is_processed: false,
            })
            .unwrap();
        let a = store.get_or_create_speaker("Astrid Berg").unwrap();
        let b = store.get_or_create_speaker("Johan Lind").unwrap();
        store.link_speaker(180, 0, a).unwrap();
        store.link_speaker(180, 1, b).unwrap();
        Arc::new(store)
    }

    fn test_settings(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.data_dir = dir.to_string_lossy().into_owned();
        settings.audio.input_dir = dir.join("audio").to_string_lossy().into_owned();
        settings.transcripts.raw_dir = dir.join("raw").to_string_lossy().into_owned();
        settings.transcripts.formatted_dir =
            dir.join("formatted").to_string_lossy().into_owned();
        settings.database.path = dir.join("test.db").to_string_lossy().into_owned();
        settings
    }

    fn pipeline_with(
        dir: &Path,
        transcriber: StubTranscriber,
        store: Arc<SqliteStore>,
    ) -> Pipeline {
        Pipeline::with_components(
            test_settings(dir),
            Arc::new(transcriber),
            Arc::new(StubEmbedder),
            store,
        )
        .unwrap()
    }

    #[test]
    fn test_group_into_jobs_regroups_flat_rows() {
        let rows = vec![
            WorkRow {
                episode_number: 180,
                file_name: "ep-180.mp3".to_string(),
                speaker_number: 0,
                speaker_name: "A".to_string(),
                speaker_id: 1,
            },
            WorkRow {
                episode_number: 180,
                file_name: "ep-180.mp3".to_string(),
                speaker_number: 1,
                speaker_name: "B".to_string(),
                speaker_id: 2,
            },
            WorkRow {
                episode_number: 181,
                file_name: "ep-181.mp3".to_string(),
                speaker_number: 0,
                speaker_name: "A".to_string(),
                speaker_id: 1,
            },
        ];

        let jobs = group_into_jobs(rows);

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].episode_number, 180);
        assert_eq!(jobs[0].speakers.len(), 2);
        assert_eq!(jobs[0].speaker_ids.get("B"), Some(&2));
        assert_eq!(jobs[1].episode_number, 181);
        assert_eq!(jobs[1].speakers.len(), 1);
    }

    #[tokio::test]
    async fn test_transcription_failure_skips_episode_without_aborting() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();
        let pipeline = pipeline_with(
            dir.path(),
            StubTranscriber {
                result: Err("provider unavailable".to_string()),
            },
            store.clone(),
        );

        let summary = pipeline.run().await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 0);
        // The episode is still unprocessed, so a later run retries it.
        assert_eq!(store.fetch_unprocessed().await.unwrap().len(), 2);
        assert_eq!(store.segment_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_successful_run_marks_episode_processed() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();
        let pipeline = pipeline_with(
            dir.path(),
            StubTranscriber {
                result: Ok(sample_transcript()),
            },
            store.clone(),
        );

        let summary = pipeline.run().await.unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 0);
        assert!(store.fetch_unprocessed().await.unwrap().is_empty());
        assert_eq!(store.segment_count().await.unwrap(), 2);

        // Both intermediate artifacts exist, named after the audio file.
        assert!(dir.path().join("raw/ep-180.json").exists());
        assert!(dir.path().join("formatted/ep-180.json").exists());

        // A second run finds nothing to do.
        let summary = pipeline.run().await.unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn test_unmapped_speakers_leave_episode_skipped() {
        let dir = tempfile::tempdir().unwrap();

        // Episode whose map knows neither transcript speaker.
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_episode(&Episode {
                episode_number: 180,
                title: "Mystery Guests".to_string(),
                file_name: "ep-180.mp3".to_string(),
                date_published: None,
                is_processed: false,
            })
            .unwrap();
        let ghost = store.get_or_create_speaker("Ghost").unwrap();
        store.link_speaker(180, 7, ghost).unwrap();
        let store = Arc::new(store);

        let pipeline = pipeline_with(
            dir.path(),
            StubTranscriber {
                result: Ok(sample_transcript()),
            },
            store.clone(),
        );

        let summary = pipeline.run().await.unwrap();

        // Formatting drops every paragraph, so nothing reaches the store and
        // the episode stays unprocessed.
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.processed, 0);
        assert_eq!(store.segment_count().await.unwrap(), 0);
        assert!(!store.fetch_unprocessed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_format_existing_uses_saved_raw_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();

        // First run saves the raw transcript.
        let pipeline = pipeline_with(
            dir.path(),
            StubTranscriber {
                result: Ok(sample_transcript()),
            },
            store.clone(),
        );
        pipeline.run().await.unwrap();

        // Reset the processed flag so the episode shows up as work again,
        // then re-format from disk with a transcriber that would fail.
        store.reset().unwrap();
        store
            .upsert_episode(&Episode {
                episode_number: 180,
                title: "On Premises".to_string(),
                file_name: "ep-180.mp3".to_string(),
                date_published: None,
                is_processed: false,
            })
            .unwrap();
        let a = store.get_or_create_speaker("Astrid Berg").unwrap();
        store.link_speaker(180, 0, a).unwrap();

        let pipeline = pipeline_with(
            dir.path(),
            StubTranscriber {
                result: Err("must not be called".to_string()),
            },
            store.clone(),
        );

        let summary = pipeline.format_existing().await.unwrap();
        assert_eq!(summary.processed, 1);
        assert!(dir.path().join("formatted/ep-180.json").exists());
    }
}
