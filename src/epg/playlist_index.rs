//! Lookup indices over secondary playlists, used to backfill tvg-ids on
//! caller channels.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::epg::cache::{Clock, TtlCache};
use crate::errors::{AppError, Result};
use crate::ingestor::m3u_parser::parse_m3u;
use crate::models::{PlaylistEntry, PlaylistIndex, PlaylistIndexEntry};
use crate::utils::{normalize_key, NameNormalizer};

/// Fetches secondary playlists and caches their lookup indices per URL,
/// with the same TTL policy as the guide loader.
pub struct PlaylistMetaIndexer {
    client: Client,
    cache: TtlCache<PlaylistIndex>,
    timeout: Duration,
}

impl PlaylistMetaIndexer {
    pub fn new(ttl_seconds: u64, timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            client: Client::new(),
            cache: TtlCache::new(ttl_seconds, clock),
            timeout,
        }
    }

    pub async fn index_for(&self, url: &str) -> Result<Arc<PlaylistIndex>> {
        if let Some((index, _)) = self.cache.get(url).await {
            return Ok(index);
        }

        let _refresh = self.cache.refresh_guard().await;
        if let Some((index, _)) = self.cache.get(url).await {
            return Ok(index);
        }

        info!("Indexing secondary playlist {}", url);
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

        let text = response
            .text()
            .await
            .map_err(|e| AppError::fetch(url, e.to_string()))?;
        let index = build_index(&parse_m3u(&text));

        let (index, _) = self.cache.insert(url.to_string(), index).await;
        Ok(index)
    }
}

/// Build the two lookup maps from parsed entries. Only entries carrying a
/// tvg-id contribute; the stream-URL map additionally requires a stream
/// URL. First writer wins per key.
pub fn build_index(entries: &[PlaylistEntry]) -> PlaylistIndex {
    let normalizer = NameNormalizer::new();
    let mut index = PlaylistIndex::default();

    for entry in entries {
        if entry.tvg_id.is_empty() {
            continue;
        }

        let item = PlaylistIndexEntry {
            tvg_id: entry.tvg_id.clone(),
            display_name: entry.name.clone(),
            tvg_name: entry.tvg_name.clone(),
            tvg_logo: entry.tvg_logo.clone(),
            stream_url: entry.url.clone(),
        };

        if !entry.url.is_empty() {
            index
                .by_stream_url
                .entry(normalize_key(&entry.url))
                .or_insert_with(|| item.clone());
        }

        for name in [&entry.name, &entry.tvg_name] {
            let key = normalizer.normalize(name);
            if !key.is_empty() {
                index
                    .by_display_name
                    .entry(key)
                    .or_insert_with(|| item.clone());
            }
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, tvg_id: &str, tvg_name: &str, url: &str) -> PlaylistEntry {
        PlaylistEntry {
            name: name.to_string(),
            url: url.to_string(),
            group_title: String::new(),
            tvg_id: tvg_id.to_string(),
            tvg_name: tvg_name.to_string(),
            tvg_logo: String::new(),
            tvg_language: String::new(),
            tvg_country: String::new(),
        }
    }

    #[test]
    fn test_url_map_requires_tvg_id_and_url() {
        let index = build_index(&[
            entry("CNN", "cnn.us", "", "http://x/CNN"),
            entry("No Id", "", "", "http://x/noid"),
            entry("No Url", "bbc.uk", "", ""),
        ]);

        assert_eq!(index.by_stream_url.len(), 1);
        assert_eq!(index.by_stream_url["http://x/cnn"].tvg_id, "cnn.us");
    }

    #[test]
    fn test_name_map_covers_display_name_and_tvg_name() {
        let index = build_index(&[entry("US - CNN HD", "cnn.us", "CNN International", "http://x/1")]);

        assert_eq!(index.by_display_name["cnn"].tvg_id, "cnn.us");
        assert_eq!(index.by_display_name["cnn international"].tvg_id, "cnn.us");
    }

    #[test]
    fn test_first_writer_wins_on_collision() {
        let index = build_index(&[
            entry("CNN", "cnn.us", "", "http://x/1"),
            entry("CNN HD", "cnn.alt", "", "http://x/2"),
        ]);

        // Both normalize to "cnn"; the first entry keeps the key.
        assert_eq!(index.by_display_name["cnn"].tvg_id, "cnn.us");
    }
}
