//! channel-forge: playlist ingestion and EPG correlation.
//!
//! Two independent paths share one model layer:
//! - [`ingestor`] turns a remote M3U playlist into a bucketized on-disk
//!   manifest, skipping work when the upstream content has not changed.
//! - [`epg`] answers "what is on now and next" for a channel list, backed
//!   by a TTL-cached XMLTV guide and secondary-playlist enrichment.

pub mod config;
pub mod epg;
pub mod errors;
pub mod ingestor;
pub mod models;
pub mod utils;
pub mod web;
