//! Correlation of caller channels against a parsed XMLTV document.
//!
//! Matching is exact on the normalized tvg-id. Name-based guide matching
//! is deliberately not performed here; enrichment is expected to have
//! resolved identifiers beforehand.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

use crate::models::{
    Channel, EpgCorrelation, MatchedChannel, Programme, UnmatchedReport, XmltvDocument,
    XmltvProgramme,
};
use crate::utils::normalize_key;

/// Cap on `next` programmes per channel.
const MAX_NEXT: usize = 12;
/// Cap on each unmatched diagnostic list.
const MAX_UNMATCHED: usize = 200;

/// Produce the matched schedule per caller channel plus unmatched
/// diagnostics. `now` is injected so results are deterministic under test.
pub fn correlate(
    channels: &[Channel],
    doc: &XmltvDocument,
    now: DateTime<Utc>,
    range_hours: i64,
) -> EpgCorrelation {
    let guide_ids: HashSet<String> = doc
        .channels
        .iter()
        .map(|c| normalize_key(&c.id))
        .filter(|id| !id.is_empty())
        .collect();

    let mut by_channel: HashMap<String, Vec<&XmltvProgramme>> = HashMap::new();
    for p in &doc.programmes {
        let key = normalize_key(&p.channel);
        if key.is_empty() {
            continue;
        }
        by_channel.entry(key).or_default().push(p);
    }
    for list in by_channel.values_mut() {
        list.sort_by_key(|p| p.start);
    }

    let window_end = now + Duration::hours(range_hours);
    let mut mapped = Vec::with_capacity(channels.len());
    let mut claimed: HashSet<String> = HashSet::new();
    let mut seen_tvg: HashSet<String> = HashSet::new();
    let mut playlist_tvg_ids: Vec<String> = Vec::new();

    for ch in channels {
        let tvg_id = ch.tvg_id.clone().unwrap_or_default();
        let norm_tvg = normalize_key(&tvg_id);
        if !norm_tvg.is_empty() && seen_tvg.insert(norm_tvg.clone()) {
            playlist_tvg_ids.push(norm_tvg.clone());
        }

        let epg_channel_id =
            (!norm_tvg.is_empty() && guide_ids.contains(&norm_tvg)).then(|| norm_tvg.clone());

        let programmes: &[&XmltvProgramme] = epg_channel_id
            .as_ref()
            .and_then(|id| by_channel.get(id))
            .map(|v| v.as_slice())
            .unwrap_or(&[]);

        let relevant: Vec<&XmltvProgramme> = programmes
            .iter()
            .filter(|p| overlaps_window(p, now, window_end))
            .copied()
            .collect();

        // If the source data has overlapping slots the first in scan order
        // wins; that is a data-quality assumption, not a guarantee.
        let current = relevant.iter().find(|p| contains_instant(p, now)).copied();

        let next: Vec<Programme> = relevant
            .iter()
            .filter(|p| p.start.is_some_and(|start| start > now))
            .take(MAX_NEXT)
            .map(|p| to_programme(p))
            .collect();

        if let Some(id) = &epg_channel_id {
            claimed.insert(id.clone());
        }

        mapped.push(MatchedChannel {
            channel_id: ch.id.clone(),
            name: ch.name.clone(),
            logo: ch.logo.clone().unwrap_or_default(),
            tvg_id,
            matched: epg_channel_id.is_some(),
            epg_channel_id,
            now: current.map(to_programme),
            next,
            programme_count: programmes.len(),
        });
    }

    let mut unclaimed: Vec<String> = guide_ids
        .iter()
        .filter(|id| !claimed.contains(*id))
        .cloned()
        .collect();
    unclaimed.sort();
    unclaimed.truncate(MAX_UNMATCHED);
    playlist_tvg_ids.truncate(MAX_UNMATCHED);

    EpgCorrelation {
        mapped,
        unmatched: UnmatchedReport {
            epg_channel_ids: unclaimed,
            playlist_tvg_ids,
        },
    }
}

/// A programme is relevant when its interval overlaps `[now, end]`.
/// Programmes missing either bound are excluded, since both are required
/// for the overlap test.
fn overlaps_window(p: &XmltvProgramme, now: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    match (p.start, p.stop) {
        (Some(start), Some(stop)) => stop >= now && start <= end,
        _ => false,
    }
}

fn contains_instant(p: &XmltvProgramme, now: DateTime<Utc>) -> bool {
    match (p.start, p.stop) {
        (Some(start), Some(stop)) => start <= now && stop >= now,
        _ => false,
    }
}

fn to_programme(p: &XmltvProgramme) -> Programme {
    Programme {
        title: p.title.clone(),
        desc: p.desc.clone(),
        start: p.start,
        stop: p.stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::XmltvChannel;

    fn caller(id: &str, tvg_id: Option<&str>) -> Channel {
        Channel {
            id: id.to_string(),
            name: format!("Channel {}", id),
            url: None,
            playlist: None,
            tvg_id: tvg_id.map(|s| s.to_string()),
            logo: None,
        }
    }

    fn programme(
        channel: &str,
        title: &str,
        start: Option<DateTime<Utc>>,
        stop: Option<DateTime<Utc>>,
    ) -> XmltvProgramme {
        XmltvProgramme {
            channel: channel.to_string(),
            start,
            stop,
            title: title.to_string(),
            desc: String::new(),
        }
    }

    fn doc(channel_ids: &[&str], programmes: Vec<XmltvProgramme>) -> XmltvDocument {
        XmltvDocument {
            channels: channel_ids
                .iter()
                .map(|id| XmltvChannel {
                    id: id.to_string(),
                    display_name: id.to_string(),
                    icon: None,
                })
                .collect(),
            programmes,
        }
    }

    fn t(now: DateTime<Utc>, minutes: i64) -> Option<DateTime<Utc>> {
        Some(now + Duration::minutes(minutes))
    }

    #[test]
    fn test_running_programme_fills_now_and_leaves_next_empty() {
        let now = Utc::now();
        let d = doc(
            &["cnn.us"],
            vec![programme("cnn.us", "News", t(now, -10), t(now, 20))],
        );
        // Case-insensitive match on the caller's tvg-id.
        let result = correlate(&[caller("1", Some("CNN.US"))], &d, now, 24);

        let m = &result.mapped[0];
        assert!(m.matched);
        assert_eq!(m.epg_channel_id.as_deref(), Some("cnn.us"));
        assert_eq!(m.now.as_ref().unwrap().title, "News");
        assert!(m.next.is_empty());
        assert_eq!(m.programme_count, 1);
    }

    #[test]
    fn test_window_boundaries() {
        let now = Utc::now();
        let window_end = now + Duration::hours(24);
        let d = doc(
            &["c"],
            vec![
                // Ended one second before now: excluded entirely.
                programme("c", "ended", Some(now - Duration::hours(2)), Some(now - Duration::seconds(1))),
                // Starts one second past the window: excluded from next.
                programme("c", "beyond", Some(window_end + Duration::seconds(1)), Some(window_end + Duration::hours(1))),
                // Starts exactly at the window edge: included.
                programme("c", "edge", Some(window_end), Some(window_end + Duration::hours(1))),
            ],
        );
        let result = correlate(&[caller("1", Some("c"))], &d, now, 24);

        let titles: Vec<_> = result.mapped[0].next.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["edge"]);
        assert!(result.mapped[0].now.is_none());
    }

    #[test]
    fn test_next_sorted_ascending_and_capped_at_12() {
        let now = Utc::now();
        let mut programmes = Vec::new();
        // Insert out of order; the correlator must sort by start.
        for i in (1..=15).rev() {
            programmes.push(programme(
                "c",
                &format!("slot{:02}", i),
                t(now, i * 30),
                t(now, i * 30 + 30),
            ));
        }
        let d = doc(&["c"], programmes);
        let result = correlate(&[caller("1", Some("c"))], &d, now, 24);

        let next = &result.mapped[0].next;
        assert_eq!(next.len(), 12);
        assert_eq!(next[0].title, "slot01");
        assert_eq!(next[11].title, "slot12");
        assert!(next.windows(2).all(|w| w[0].start <= w[1].start));
    }

    #[test]
    fn test_same_tvg_id_yields_identical_results() {
        let now = Utc::now();
        let d = doc(
            &["c"],
            vec![
                programme("c", "live", t(now, -5), t(now, 25)),
                programme("c", "later", t(now, 25), t(now, 55)),
            ],
        );
        let result = correlate(&[caller("1", Some("c")), caller("2", Some("C"))], &d, now, 24);

        assert_eq!(result.mapped[0].now, result.mapped[1].now);
        assert_eq!(result.mapped[0].next, result.mapped[1].next);
    }

    #[test]
    fn test_programme_without_bounds_is_counted_but_never_selected() {
        let now = Utc::now();
        let d = doc(
            &["c"],
            vec![
                programme("c", "no-dates", None, None),
                programme("c", "live", t(now, -5), t(now, 25)),
            ],
        );
        let result = correlate(&[caller("1", Some("c"))], &d, now, 24);

        let m = &result.mapped[0];
        assert_eq!(m.programme_count, 2);
        assert_eq!(m.now.as_ref().unwrap().title, "live");
        assert!(m.next.is_empty());
    }

    #[test]
    fn test_unknown_tvg_id_is_unmatched() {
        let now = Utc::now();
        let d = doc(&["known"], vec![]);
        let result = correlate(&[caller("1", Some("missing"))], &d, now, 24);

        let m = &result.mapped[0];
        assert!(!m.matched);
        assert!(m.epg_channel_id.is_none());
        assert_eq!(m.programme_count, 0);
    }

    #[test]
    fn test_unmatched_diagnostics() {
        let now = Utc::now();
        let d = doc(&["a", "b", "c"], vec![]);
        let result = correlate(
            &[
                caller("1", Some("a")),
                caller("2", Some("a")),
                caller("3", Some("zz")),
                caller("4", None),
            ],
            &d,
            now,
            24,
        );

        assert_eq!(result.unmatched.epg_channel_ids, ["b", "c"]);
        // De-duplicated, empty ids omitted.
        assert_eq!(result.unmatched.playlist_tvg_ids, ["a", "zz"]);
    }
}
