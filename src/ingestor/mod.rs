//! Playlist ingestion: change detection, parsing, classification,
//! bucketization and manifest writing, composed by [`IngestService`].
//!
//! One run moves through `Idle -> Checking -> (Unchanged | Fetching) ->
//! Classifying -> Writing -> Done`, or ends in `Failed`. A failed run
//! persists nothing; the prior ingest state stays authoritative for the
//! next attempt.

use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

pub mod bucketizer;
pub mod change_detector;
pub mod classifier;
pub mod m3u_parser;
pub mod manifest_writer;

use crate::config::IngestConfig;
use crate::errors::{AppError, Result};
use crate::models::{IngestCounts, IngestOutcome, IngestPhase, IngestState};
use bucketizer::{bucketize, SplitOptions};
use change_detector::{ChangeCheck, ChangeDetector};
use classifier::Classifier;
use manifest_writer::ManifestWriter;

const STATE_FILE: &str = "state.json";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct IngestService {
    config: IngestConfig,
    detector: ChangeDetector,
    classifier: Classifier,
    /// Serializes ingest runs; a second trigger while one is in flight is
    /// rejected rather than interleaved.
    run_guard: Mutex<()>,
    phase: RwLock<IngestPhase>,
}

impl IngestService {
    pub fn new(config: IngestConfig) -> Self {
        let classifier = Classifier::new(&config.series_markers, &config.vod_markers);
        Self {
            config,
            detector: ChangeDetector::new(FETCH_TIMEOUT),
            classifier,
            run_guard: Mutex::new(()),
            phase: RwLock::new(IngestPhase::Idle),
        }
    }

    /// Trigger one ingest run. `force` bypasses change detection and always
    /// performs the full download.
    pub async fn run(&self, force: bool) -> Result<IngestOutcome> {
        if self.config.playlist_url.is_empty() {
            return Err(AppError::configuration("playlist_url is not configured"));
        }

        let _guard = self
            .run_guard
            .try_lock()
            .map_err(|_| AppError::IngestInProgress)?;

        let result = self.run_locked(force).await;
        match &result {
            Ok(outcome) => {
                self.set_phase(IngestPhase::Done).await;
                if let IngestOutcome::Ok { counts, .. } = outcome {
                    info!(
                        "Ingest completed: {} entries ({} live, {} vod, {} series)",
                        counts.all, counts.live, counts.vod, counts.series
                    );
                }
            }
            Err(e) => {
                self.set_phase(IngestPhase::Failed).await;
                warn!("Ingest run failed: {}", e);
            }
        }
        result
    }

    async fn run_locked(&self, force: bool) -> Result<IngestOutcome> {
        let url = &self.config.playlist_url;
        let prior = self.load_state();

        let fetched = if force {
            self.set_phase(IngestPhase::Fetching).await;
            info!("Forced ingest, fetching {}", url);
            self.detector.fetch(url).await?
        } else {
            self.set_phase(IngestPhase::Checking).await;
            match self.detector.check(url, prior.as_ref()).await? {
                ChangeCheck::Unchanged { reason } => {
                    return Ok(IngestOutcome::Noop {
                        reason: reason.to_string(),
                    });
                }
                ChangeCheck::Changed(fetched) => fetched,
            }
        };

        self.set_phase(IngestPhase::Classifying).await;
        let entries = m3u_parser::parse_m3u(&fetched.body);
        let all = entries.len();
        let set = self.classifier.classify(entries);
        let counts = IngestCounts {
            all,
            live: set.live.len(),
            vod: set.vod.len(),
            series: set.series.len(),
        };

        self.set_phase(IngestPhase::Writing).await;
        let split = SplitOptions {
            by_group: self.config.split_by_group,
            by_language: self.config.split_by_language,
            by_country: self.config.split_by_country,
        };
        let max = self.config.max_items_per_file;
        let writer = ManifestWriter::new(
            self.config.channels_dir.clone(),
            self.config.public_base_url.clone(),
            self.config.readme_title.clone(),
        );

        let live = writer.write_section("live", &bucketize(set.live, split, max))?;
        let vod = writer.write_section("vod", &bucketize(set.vod, split, max))?;
        let series = writer.write_section("series", &bucketize(set.series, split, max))?;
        writer.write_index(Utc::now(), &live, &vod, &series)?;

        self.save_state(&IngestState {
            updated_at: Utc::now(),
            sha256: fetched.sha256,
            etag: fetched.etag,
            last_modified: fetched.last_modified,
            counts,
        })?;

        Ok(IngestOutcome::Ok {
            counts,
            files: vec!["index.json".to_string(), "README.md".to_string()],
        })
    }

    /// Last persisted ingest state, if any. A missing or unreadable state
    /// file simply means "no prior ingest".
    pub fn load_state(&self) -> Option<IngestState> {
        let path = self.state_path();
        let contents = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("Ignoring unreadable state file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn save_state(&self, state: &IngestState) -> Result<()> {
        std::fs::create_dir_all(&self.config.channels_dir)?;
        std::fs::write(self.state_path(), serde_json::to_string_pretty(state)?)?;
        Ok(())
    }

    fn state_path(&self) -> PathBuf {
        self.config.channels_dir.join(STATE_FILE)
    }

    pub async fn phase(&self) -> IngestPhase {
        *self.phase.read().await
    }

    async fn set_phase(&self, phase: IngestPhase) {
        *self.phase.write().await = phase;
    }
}
