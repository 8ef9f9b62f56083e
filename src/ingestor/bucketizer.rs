//! Grouping and pagination of classified entries into named buckets.

use crate::models::{Bucket, PlaylistEntry};

/// Which entry dimensions contribute to the bucket key.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitOptions {
    pub by_group: bool,
    pub by_language: bool,
    pub by_country: bool,
}

/// Group entries into buckets keyed by the enabled split dimensions, then
/// chunk any bucket exceeding `max_items_per_file` (0 = unlimited) into
/// equal-or-smaller pieces named `"<key> (<i>/<n>)"`. Output is sorted by
/// bucket key for deterministic manifests.
pub fn bucketize(
    entries: Vec<PlaylistEntry>,
    split: SplitOptions,
    max_items_per_file: usize,
) -> Vec<Bucket> {
    // Insertion order is kept so chunking preserves the original relative
    // order within each bucket.
    let mut keys: Vec<String> = Vec::new();
    let mut grouped: Vec<Vec<PlaylistEntry>> = Vec::new();

    for entry in entries {
        let key = bucket_key(&entry, split);
        match keys.iter().position(|k| *k == key) {
            Some(i) => grouped[i].push(entry),
            None => {
                keys.push(key);
                grouped.push(vec![entry]);
            }
        }
    }

    let mut buckets = Vec::new();
    for (key, items) in keys.into_iter().zip(grouped) {
        if max_items_per_file > 0 && items.len() > max_items_per_file {
            let chunk_count = items.len().div_ceil(max_items_per_file);
            let mut chunks: Vec<Vec<PlaylistEntry>> =
                (0..chunk_count).map(|_| Vec::new()).collect();
            for (i, item) in items.into_iter().enumerate() {
                chunks[i / max_items_per_file].push(item);
            }
            for (i, chunk) in chunks.into_iter().enumerate() {
                buckets.push(Bucket {
                    key: format!("{} ({}/{})", key, i + 1, chunk_count),
                    entries: chunk,
                });
            }
        } else {
            buckets.push(Bucket { key, entries: items });
        }
    }

    buckets.sort_by(|a, b| a.key.cmp(&b.key));
    buckets
}

fn bucket_key(entry: &PlaylistEntry, split: SplitOptions) -> String {
    let mut parts = Vec::new();
    if split.by_group {
        parts.push(or_unknown(&entry.group_title));
    }
    if split.by_language {
        parts.push(or_unknown(&entry.tvg_language));
    }
    if split.by_country {
        parts.push(or_unknown(&entry.tvg_country));
    }

    if parts.is_empty() {
        "all".to_string()
    } else {
        parts.join(" | ")
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "Unknown"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, group: &str, lang: &str, country: &str) -> PlaylistEntry {
        PlaylistEntry {
            name: name.to_string(),
            url: format!("http://x/{}", name),
            group_title: group.to_string(),
            tvg_id: String::new(),
            tvg_name: String::new(),
            tvg_logo: String::new(),
            tvg_language: lang.to_string(),
            tvg_country: country.to_string(),
        }
    }

    #[test]
    fn test_no_split_yields_single_all_bucket() {
        let buckets = bucketize(
            vec![entry("a", "News", "en", "us"), entry("b", "Sports", "", "")],
            SplitOptions::default(),
            0,
        );
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].key, "all");
        assert_eq!(buckets[0].entries.len(), 2);
    }

    #[test]
    fn test_composite_key_with_unknown_defaults() {
        let split = SplitOptions {
            by_group: true,
            by_language: true,
            by_country: false,
        };
        let buckets = bucketize(vec![entry("a", "News", "", "us")], split, 0);
        assert_eq!(buckets[0].key, "News | Unknown");
    }

    #[test]
    fn test_buckets_sorted_by_key() {
        let split = SplitOptions {
            by_group: true,
            ..Default::default()
        };
        let buckets = bucketize(
            vec![
                entry("a", "Sports", "", ""),
                entry("b", "News", "", ""),
                entry("c", "Kids", "", ""),
            ],
            split,
            0,
        );
        let keys: Vec<_> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, ["Kids", "News", "Sports"]);
    }

    #[test]
    fn test_chunking_sizes_and_count() {
        let entries: Vec<_> = (0..25).map(|i| entry(&format!("c{:02}", i), "", "", "")).collect();
        let buckets = bucketize(entries, SplitOptions::default(), 10);

        // ceil(25/10) = 3 chunks, each <= 10 entries
        assert_eq!(buckets.len(), 3);
        assert!(buckets.iter().all(|b| b.entries.len() <= 10));
        assert_eq!(
            buckets.iter().map(|b| b.entries.len()).sum::<usize>(),
            25
        );
        let keys: Vec<_> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, ["all (1/3)", "all (2/3)", "all (3/3)"]);
    }

    #[test]
    fn test_chunking_preserves_relative_order() {
        let entries: Vec<_> = (0..7).map(|i| entry(&format!("c{}", i), "", "", "")).collect();
        let buckets = bucketize(entries, SplitOptions::default(), 3);
        let names: Vec<_> = buckets
            .iter()
            .flat_map(|b| b.entries.iter().map(|e| e.name.as_str()))
            .collect();
        assert_eq!(names, ["c0", "c1", "c2", "c3", "c4", "c5", "c6"]);
    }

    #[test]
    fn test_exact_multiple_is_not_padded() {
        let entries: Vec<_> = (0..10).map(|i| entry(&format!("c{}", i), "", "", "")).collect();
        let buckets = bucketize(entries, SplitOptions::default(), 5);
        assert_eq!(buckets.len(), 2);
        assert!(buckets.iter().all(|b| b.entries.len() == 5));
    }
}
