//! Live/VOD/series classification via configurable marker patterns.

use regex::Regex;
use tracing::warn;

use crate::models::{ClassifiedSet, PlaylistEntry};

/// Partitions playlist entries by matching marker regexes against the
/// concatenation of name, group title and URL. Series markers are checked
/// first, so an entry matching both lists lands in `series`. With no marker
/// lists configured everything is live.
pub struct Classifier {
    series_markers: Vec<Regex>,
    vod_markers: Vec<Regex>,
}

impl Classifier {
    /// Compile marker lists, skipping (and logging) invalid patterns so a
    /// bad configuration entry never takes down ingestion.
    pub fn new(series_patterns: &[String], vod_patterns: &[String]) -> Self {
        Self {
            series_markers: compile_markers(series_patterns, "series"),
            vod_markers: compile_markers(vod_patterns, "vod"),
        }
    }

    pub fn classify(&self, entries: Vec<PlaylistEntry>) -> ClassifiedSet {
        let mut set = ClassifiedSet::default();

        for entry in entries {
            let haystack = format!("{} {} {}", entry.name, entry.group_title, entry.url);
            if self.series_markers.iter().any(|rx| rx.is_match(&haystack)) {
                set.series.push(entry);
            } else if self.vod_markers.iter().any(|rx| rx.is_match(&haystack)) {
                set.vod.push(entry);
            } else {
                set.live.push(entry);
            }
        }

        set
    }
}

fn compile_markers(patterns: &[String], kind: &str) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(rx) => Some(rx),
            Err(e) => {
                warn!("Skipping invalid {} marker pattern '{}': {}", kind, p, e);
                None
            }
        })
        .collect()
}
