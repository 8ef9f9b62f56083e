//! Shared data types for the ingestion and EPG correlation paths.
//!
//! Everything that crosses a module boundary lives here: parsed playlist
//! entries, ingest state, XMLTV documents and the JSON payloads returned by
//! the web layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One playlist entry, produced from an `#EXTINF` line plus the following
/// URL line. Attributes that were absent or malformed are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub group_title: String,
    #[serde(default)]
    pub tvg_id: String,
    #[serde(default)]
    pub tvg_name: String,
    #[serde(default)]
    pub tvg_logo: String,
    #[serde(default)]
    pub tvg_language: String,
    #[serde(default)]
    pub tvg_country: String,
}

/// Disjoint partition of a parsed playlist into live, VOD and series
/// entries. The union always equals the classifier's input.
#[derive(Debug, Default)]
pub struct ClassifiedSet {
    pub live: Vec<PlaylistEntry>,
    pub vod: Vec<PlaylistEntry>,
    pub series: Vec<PlaylistEntry>,
}

/// A named group of entries destined for one output file.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub key: String,
    pub entries: Vec<PlaylistEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IngestCounts {
    pub all: usize,
    pub live: usize,
    pub vod: usize,
    pub series: usize,
}

/// Persisted once per successful ingest run, read back before the next
/// attempt to drive change detection. Overwritten wholesale, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestState {
    pub updated_at: DateTime<Utc>,
    pub sha256: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub counts: IngestCounts,
}

/// Result of one ingest trigger.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum IngestOutcome {
    /// Upstream content has not changed; nothing was written.
    Noop { reason: String },
    /// A full run completed and the manifest was rewritten.
    Ok {
        counts: IngestCounts,
        files: Vec<String>,
    },
}

/// Observable phase of the ingest state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestPhase {
    Idle,
    Checking,
    Fetching,
    Classifying,
    Writing,
    Done,
    Failed,
}

/// Per-bucket record returned by the manifest writer, later folded into the
/// consolidated index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketMeta {
    pub name: String,
    pub count: usize,
    pub rel_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub count: usize,
    pub url: String,
    pub json: String,
}

/// The consolidated `index.json` document enumerating every bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelIndex {
    pub title: String,
    pub description: String,
    pub generated_at: DateTime<Utc>,
    pub live: Vec<IndexEntry>,
    pub vod: Vec<IndexEntry>,
    pub series: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct XmltvChannel {
    pub id: String,
    pub display_name: String,
    pub icon: Option<String>,
}

/// A guide programme. `start`/`stop` are `None` when the source datetime was
/// missing or unparseable; such programmes are excluded from any time-window
/// filter that needs the missing bound.
#[derive(Debug, Clone, Serialize)]
pub struct XmltvProgramme {
    pub channel: String,
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
    pub title: String,
    pub desc: String,
}

/// Parsed XMLTV guide. Owned by the EPG loader's cache entry and shared
/// read-only with the correlator for the duration of one request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct XmltvDocument {
    pub channels: Vec<XmltvChannel>,
    pub programmes: Vec<XmltvProgramme>,
}

/// The caller-supplied channel contract. Field names are fixed here at the
/// collaborator boundary so the core never guesses at record shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Secondary playlist this channel was sourced from, used for tvg-id
    /// enrichment.
    #[serde(default)]
    pub playlist: Option<String>,
    #[serde(default)]
    pub tvg_id: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Programme {
    pub title: String,
    pub desc: String,
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
}

/// Per-channel correlation result. Recomputed per request, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedChannel {
    pub channel_id: String,
    pub name: String,
    pub logo: String,
    pub tvg_id: String,
    pub epg_channel_id: Option<String>,
    pub now: Option<Programme>,
    pub next: Vec<Programme>,
    pub programme_count: usize,
    pub matched: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedReport {
    pub epg_channel_ids: Vec<String>,
    pub playlist_tvg_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpgCorrelation {
    pub mapped: Vec<MatchedChannel>,
    pub unmatched: UnmatchedReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpgQueryMeta {
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
    pub cached: bool,
    pub range_hours: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpgQueryResponse {
    pub meta: EpgQueryMeta,
    pub channels: Vec<MatchedChannel>,
    pub unmatched: UnmatchedReport,
}

/// Metadata extracted from a secondary playlist, used to backfill tvg-ids
/// on caller channels.
#[derive(Debug, Clone)]
pub struct PlaylistIndexEntry {
    pub tvg_id: String,
    pub display_name: String,
    pub tvg_name: String,
    pub tvg_logo: String,
    pub stream_url: String,
}

/// Lookup indices built from one secondary playlist, cached per URL.
#[derive(Debug, Default)]
pub struct PlaylistIndex {
    pub by_stream_url: HashMap<String, PlaylistIndexEntry>,
    pub by_display_name: HashMap<String, PlaylistIndexEntry>,
}
