//! Change-aware playlist fetching.
//!
//! Decision order, first decisive check wins: HEAD ETag equality, HEAD
//! Last-Modified equality, then full GET plus SHA-256 body comparison.
//! HEAD failures are tolerated and fall through to the full GET; a terminal
//! non-2xx on the GET is a fetch error for the whole attempt.

use reqwest::{header, Client};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::{AppError, Result};
use crate::models::IngestState;

/// Conditional-request metadata observed on a HEAD response.
#[derive(Debug, Default, Clone)]
pub struct HeadInfo {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// A full playlist download with the metadata needed to persist ingest state.
#[derive(Debug, Clone)]
pub struct FetchedPlaylist {
    pub body: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub sha256: String,
}

#[derive(Debug)]
pub enum ChangeCheck {
    Unchanged { reason: &'static str },
    Changed(FetchedPlaylist),
}

pub struct ChangeDetector {
    client: Client,
    timeout: Duration,
}

impl ChangeDetector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    /// Decide whether the playlist at `url` has changed since `prior`.
    pub async fn check(&self, url: &str, prior: Option<&IngestState>) -> Result<ChangeCheck> {
        if let Some(state) = prior {
            let head = self.head(url).await;
            if let Some(reason) = header_match(state, &head) {
                info!("Playlist unchanged ({}), skipping download", reason);
                return Ok(ChangeCheck::Unchanged { reason });
            }
        }

        let fetched = self.fetch(url).await?;
        if let Some(state) = prior {
            if state.sha256 == fetched.sha256 {
                info!("Playlist unchanged (content hash matches), discarding body");
                return Ok(ChangeCheck::Unchanged {
                    reason: "content hash unchanged",
                });
            }
        }

        Ok(ChangeCheck::Changed(fetched))
    }

    /// Unconditional full download, used by forced ingest runs and as the
    /// fallback when conditional metadata is inconclusive.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPlaylist> {
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

        let etag = header_value(response.headers(), header::ETAG);
        let last_modified = header_value(response.headers(), header::LAST_MODIFIED);
        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch(url, e.to_string()))?;
        let sha256 = sha256_hex(body.as_bytes());

        debug!("Downloaded playlist: {} bytes, sha256={}", body.len(), sha256);

        Ok(FetchedPlaylist {
            body,
            etag,
            last_modified,
            sha256,
        })
    }

    async fn head(&self, url: &str) -> HeadInfo {
        match self.client.head(url).timeout(self.timeout).send().await {
            Ok(response) => HeadInfo {
                etag: header_value(response.headers(), header::ETAG),
                last_modified: header_value(response.headers(), header::LAST_MODIFIED),
            },
            Err(e) => {
                // Inconclusive, the full GET decides.
                debug!("HEAD request to {} failed: {}", url, e);
                HeadInfo::default()
            }
        }
    }
}

/// Pure precedence check over conditional metadata: ETag first, then
/// Last-Modified. Returns the reason when the stored state proves the
/// content unchanged.
fn header_match(state: &IngestState, head: &HeadInfo) -> Option<&'static str> {
    match (&head.etag, &state.etag) {
        (Some(current), Some(stored)) if current == stored => return Some("etag unchanged"),
        _ => {}
    }
    match (&head.last_modified, &state.last_modified) {
        (Some(current), Some(stored)) if current == stored => {
            return Some("last-modified unchanged")
        }
        _ => {}
    }
    None
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn header_value(headers: &header::HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IngestCounts;
    use chrono::Utc;

    fn state(etag: Option<&str>, last_modified: Option<&str>, sha256: &str) -> IngestState {
        IngestState {
            updated_at: Utc::now(),
            sha256: sha256.to_string(),
            etag: etag.map(|s| s.to_string()),
            last_modified: last_modified.map(|s| s.to_string()),
            counts: IngestCounts {
                all: 0,
                live: 0,
                vod: 0,
                series: 0,
            },
        }
    }

    #[test]
    fn test_etag_match_wins_first() {
        let st = state(Some("\"abc\""), Some("Mon"), "h");
        let head = HeadInfo {
            etag: Some("\"abc\"".to_string()),
            // Differing last-modified must not matter once the etag matched.
            last_modified: Some("Tue".to_string()),
        };
        assert_eq!(header_match(&st, &head), Some("etag unchanged"));
    }

    #[test]
    fn test_last_modified_fallback() {
        let st = state(Some("\"abc\""), Some("Mon"), "h");
        let head = HeadInfo {
            etag: Some("\"different\"".to_string()),
            last_modified: Some("Mon".to_string()),
        };
        assert_eq!(header_match(&st, &head), Some("last-modified unchanged"));
    }

    #[test]
    fn test_missing_stored_metadata_is_inconclusive() {
        let st = state(None, None, "h");
        let head = HeadInfo {
            etag: Some("\"abc\"".to_string()),
            last_modified: Some("Mon".to_string()),
        };
        assert_eq!(header_match(&st, &head), None);
    }

    #[test]
    fn test_missing_head_metadata_is_inconclusive() {
        let st = state(Some("\"abc\""), Some("Mon"), "h");
        assert_eq!(header_match(&st, &HeadInfo::default()), None);
    }

    #[test]
    fn test_sha256_hex() {
        // Well-known digest of the empty input.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(sha256_hex(b"a"), sha256_hex(b"b"));
    }
}
