//! Backfilling of guide identifiers on caller channels from their
//! secondary playlists.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::epg::playlist_index::PlaylistMetaIndexer;
use crate::models::{Channel, PlaylistIndex};
use crate::utils::{normalize_key, NameNormalizer};

pub struct ChannelEnricher {
    indexer: Arc<PlaylistMetaIndexer>,
}

impl ChannelEnricher {
    pub fn new(indexer: Arc<PlaylistMetaIndexer>) -> Self {
        Self { indexer }
    }

    /// Backfill tvg-id (and logo, where empty) on channels that declare a
    /// playlist source. Each distinct source is indexed once; sources are
    /// fetched concurrently, and a failing source only leaves its own
    /// channels unenriched.
    pub async fn enrich(&self, channels: Vec<Channel>) -> Vec<Channel> {
        let mut sources: Vec<String> = Vec::new();
        for ch in &channels {
            if let Some(playlist) = &ch.playlist {
                if needs_enrichment(ch) && !sources.contains(playlist) {
                    sources.push(playlist.clone());
                }
            }
        }

        let fetches = sources.iter().map(|url| async {
            let result = self.indexer.index_for(url).await;
            (url.clone(), result)
        });

        let mut indexes: HashMap<String, Arc<PlaylistIndex>> = HashMap::new();
        for (url, result) in futures::future::join_all(fetches).await {
            match result {
                Ok(index) => {
                    indexes.insert(url, index);
                }
                Err(e) => {
                    // Failure isolation: skip this source, keep the rest.
                    warn!("Skipping playlist {} during enrichment: {}", url, e);
                }
            }
        }

        apply_indexes(channels, &indexes)
    }
}

/// Pure enrichment core over already-fetched indexes. URL match is
/// authoritative; name match is the fallback.
pub fn apply_indexes(
    mut channels: Vec<Channel>,
    indexes: &HashMap<String, Arc<PlaylistIndex>>,
) -> Vec<Channel> {
    let normalizer = NameNormalizer::new();

    for ch in &mut channels {
        if !needs_enrichment(ch) {
            continue;
        }
        let Some(index) = ch.playlist.as_ref().and_then(|p| indexes.get(p)) else {
            continue;
        };

        let by_url = ch
            .url
            .as_deref()
            .map(normalize_key)
            .filter(|k| !k.is_empty())
            .and_then(|k| index.by_stream_url.get(&k));

        let hit = by_url.or_else(|| {
            let key = normalizer.normalize(&ch.name);
            if key.is_empty() {
                None
            } else {
                index.by_display_name.get(&key)
            }
        });

        if let Some(entry) = hit {
            ch.tvg_id = Some(entry.tvg_id.clone());
            if ch.logo.as_deref().unwrap_or("").is_empty() && !entry.tvg_logo.is_empty() {
                ch.logo = Some(entry.tvg_logo.clone());
            }
        }
    }

    channels
}

fn needs_enrichment(ch: &Channel) -> bool {
    ch.tvg_id.as_deref().unwrap_or("").is_empty()
}
