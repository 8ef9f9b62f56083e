//! Persistence of bucket playlists, metadata sidecars and the consolidated
//! index documents.
//!
//! All writes are plain filesystem writes under one channels root;
//! re-running with identical buckets reproduces the same structure. The
//! `generated_at` timestamp embedded in the index is metadata, not identity.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

use crate::ingestor::m3u_parser::render_m3u;
use crate::models::{Bucket, BucketMeta, ChannelIndex, IndexEntry};
use crate::utils::sanitize_filename;

pub struct ManifestWriter {
    root: PathBuf,
    public_base_url: String,
    readme_title: String,
}

impl ManifestWriter {
    pub fn new(root: PathBuf, public_base_url: String, readme_title: String) -> Self {
        Self {
            root,
            public_base_url,
            readme_title,
        }
    }

    /// Write one classification section (`live`, `vod` or `series`): a
    /// playlist file plus a `{name, count}` sidecar per bucket.
    pub fn write_section(
        &self,
        section: &str,
        buckets: &[Bucket],
    ) -> crate::errors::Result<Vec<BucketMeta>> {
        let dir = self.root.join(section);
        std::fs::create_dir_all(&dir)?;

        let mut meta = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let filename = format!("{}.m3u", sanitize_filename(&bucket.key));
            let path = dir.join(&filename);

            std::fs::write(&path, render_m3u(&bucket.entries))?;
            std::fs::write(
                path.with_extension("json"),
                serde_json::to_string_pretty(&json!({
                    "name": bucket.key,
                    "count": bucket.entries.len(),
                }))?,
            )?;

            debug!(
                "Wrote bucket '{}' ({} entries) to {}",
                bucket.key,
                bucket.entries.len(),
                path.display()
            );

            meta.push(BucketMeta {
                name: bucket.key.clone(),
                count: bucket.entries.len(),
                rel_path: format!("{}/{}", section, filename),
            });
        }

        Ok(meta)
    }

    /// Build and persist the consolidated `index.json` and the
    /// human-readable `README.md` once every section has been written.
    pub fn write_index(
        &self,
        generated_at: DateTime<Utc>,
        live: &[BucketMeta],
        vod: &[BucketMeta],
        series: &[BucketMeta],
    ) -> crate::errors::Result<ChannelIndex> {
        let index = ChannelIndex {
            title: self.readme_title.clone(),
            description: "Auto-split LIVE/VOD/SERIES indexes".to_string(),
            generated_at,
            live: self.index_entries(live),
            vod: self.index_entries(vod),
            series: self.index_entries(series),
        };

        std::fs::create_dir_all(&self.root)?;
        std::fs::write(
            self.root.join("index.json"),
            serde_json::to_string_pretty(&index)?,
        )?;
        std::fs::write(self.root.join("README.md"), self.render_readme(&index))?;

        Ok(index)
    }

    fn index_entries(&self, meta: &[BucketMeta]) -> Vec<IndexEntry> {
        meta.iter()
            .map(|m| {
                let url = if self.public_base_url.is_empty() {
                    m.rel_path.clone()
                } else {
                    format!(
                        "{}/{}",
                        self.public_base_url.trim_end_matches('/'),
                        m.rel_path
                    )
                };
                let json = match url.strip_suffix(".m3u") {
                    Some(stem) => format!("{}.json", stem),
                    None => format!("{}.json", url),
                };
                IndexEntry {
                    name: m.name.clone(),
                    count: m.count,
                    url,
                    json,
                }
            })
            .collect()
    }

    fn render_readme(&self, index: &ChannelIndex) -> String {
        let mut lines = vec![
            format!("# {}", index.title),
            String::new(),
            format!("Generated: `{}`", index.generated_at.to_rfc3339()),
            String::new(),
        ];

        for (heading, entries) in [
            ("## LIVE", &index.live),
            ("## VOD", &index.vod),
            ("## SERIES", &index.series),
        ] {
            lines.push(heading.to_string());
            for e in entries {
                lines.push(format!(
                    "- **{}** — {}\n  - M3U: {}\n  - JSON: {}",
                    e.name, e.count, e.url, e.json
                ));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}
