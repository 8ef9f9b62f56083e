//! Fetching and caching of parsed XMLTV documents.

use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::epg::cache::{Clock, TtlCache};
use crate::epg::xmltv::parse_xmltv;
use crate::errors::{AppError, Result};
use crate::models::XmltvDocument;

/// A guide document plus the metadata the query response reports.
pub struct LoadedEpg {
    pub document: Arc<XmltvDocument>,
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
    pub cached: bool,
}

/// Fetches a guide by URL and keeps the parsed document in a TTL cache.
/// A cache hit short-circuits network access entirely; a failed fetch or
/// parse leaves the cache untouched.
pub struct EpgLoader {
    client: Client,
    cache: TtlCache<XmltvDocument>,
    timeout: Duration,
}

impl EpgLoader {
    pub fn new(ttl_seconds: u64, timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            client: Client::new(),
            cache: TtlCache::new(ttl_seconds, clock),
            timeout,
        }
    }

    pub async fn load(&self, url: &str) -> Result<LoadedEpg> {
        if let Some((document, fetched_at)) = self.cache.get(url).await {
            return Ok(LoadedEpg {
                document,
                source_url: url.to_string(),
                fetched_at,
                cached: true,
            });
        }

        let _refresh = self.cache.refresh_guard().await;
        // Another task may have refreshed while we waited for the guard.
        if let Some((document, fetched_at)) = self.cache.get(url).await {
            return Ok(LoadedEpg {
                document,
                source_url: url.to_string(),
                fetched_at,
                cached: true,
            });
        }

        info!("Fetching XMLTV guide from {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, format!("HTTP {}", status)));
        }

        let xml = response
            .text()
            .await
            .map_err(|e| AppError::fetch(url, e.to_string()))?;
        let document = parse_xmltv(&xml)?;
        info!(
            "Parsed XMLTV guide: {} channels, {} programmes",
            document.channels.len(),
            document.programmes.len()
        );

        let (document, fetched_at) = self.cache.insert(url.to_string(), document).await;
        Ok(LoadedEpg {
            document,
            source_url: url.to_string(),
            fetched_at,
            cached: false,
        })
    }
}
