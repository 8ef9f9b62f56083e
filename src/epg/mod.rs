//! EPG query path: guide loading, channel enrichment and correlation.

pub mod cache;
pub mod correlator;
pub mod enricher;
pub mod loader;
pub mod playlist_index;
pub mod xmltv;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::EpgConfig;
use crate::epg::cache::{Clock, SystemClock};
use crate::epg::correlator::correlate;
use crate::epg::enricher::ChannelEnricher;
use crate::epg::loader::EpgLoader;
use crate::epg::playlist_index::PlaylistMetaIndexer;
use crate::errors::{AppError, Result};
use crate::models::{Channel, EpgQueryMeta, EpgQueryResponse};

/// Source of the caller channel list the correlation runs against.
#[async_trait]
pub trait ChannelProvider: Send + Sync {
    async fn channels(&self) -> Result<Vec<Channel>>;
}

/// Default provider: a JSON file holding an array of channels. A missing
/// file is not an error, it just yields an empty list.
pub struct JsonFileChannelProvider {
    path: PathBuf,
}

impl JsonFileChannelProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ChannelProvider for JsonFileChannelProvider {
    async fn channels(&self) -> Result<Vec<Channel>> {
        if !self.path.exists() {
            warn!("Channel file {} not found, using empty list", self.path.display());
            return Ok(Vec::new());
        }
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let channels: Vec<Channel> = serde_json::from_str(&contents)?;
        Ok(channels)
    }
}

/// Orchestrates one EPG query: load the guide, enrich the channels,
/// correlate, and assemble the response with its cache metadata.
pub struct EpgService {
    config: EpgConfig,
    loader: EpgLoader,
    enricher: ChannelEnricher,
    clock: Arc<dyn Clock>,
}

impl EpgService {
    pub fn new(config: EpgConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: EpgConfig, clock: Arc<dyn Clock>) -> Self {
        let timeout = Duration::from_secs(config.fetch_timeout_seconds);
        let loader = EpgLoader::new(config.cache_ttl_seconds, timeout, Arc::clone(&clock));
        let indexer = Arc::new(PlaylistMetaIndexer::new(
            config.cache_ttl_seconds,
            timeout,
            Arc::clone(&clock),
        ));
        Self {
            config,
            loader,
            enricher: ChannelEnricher::new(indexer),
            clock,
        }
    }

    /// Run a full query over the given channels. `hours` falls back to the
    /// configured default when absent or non-positive.
    pub async fn query(&self, channels: Vec<Channel>, hours: Option<i64>) -> Result<EpgQueryResponse> {
        if self.config.url.is_empty() {
            return Err(AppError::configuration("no EPG source URL configured"));
        }

        let range_hours = hours
            .filter(|h| *h > 0)
            .unwrap_or(self.config.default_range_hours);

        let loaded = self.loader.load(&self.config.url).await?;
        let channels = self.enricher.enrich(channels).await;

        let now = self.clock.now();
        let correlation = correlate(&channels, &loaded.document, now, range_hours);

        let matched = correlation.mapped.iter().filter(|c| c.matched).count();
        info!(
            "EPG query: {} channels, {} matched, window {}h, cached={}",
            correlation.mapped.len(),
            matched,
            range_hours,
            loaded.cached
        );

        Ok(EpgQueryResponse {
            meta: EpgQueryMeta {
                source_url: loaded.source_url,
                fetched_at: loaded.fetched_at,
                cached: loaded.cached,
                range_hours,
            },
            channels: correlation.mapped,
            unmatched: correlation.unmatched,
        })
    }
}
