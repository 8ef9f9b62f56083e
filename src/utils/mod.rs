//! Utility functions shared by the ingestion and EPG paths
//!
//! - filename sanitization for manifest output
//! - key normalization for tvg-id and stream-URL matching
//! - display-name normalization for name-based playlist lookups

use regex::Regex;

/// Sanitize a bucket name into a safe filename: anything outside
/// `[A-Za-z0-9._-]` collapses to a single underscore, leading and trailing
/// underscores are stripped.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_replacement = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            out.push(ch);
            last_was_replacement = false;
        } else if !last_was_replacement {
            out.push('_');
            last_was_replacement = true;
        }
    }
    out.trim_matches('_').to_string()
}

/// Normalize an identifier or URL for exact-match lookups: trim and
/// case-fold. `"CNN.us"` becomes `"cnn.us"`.
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Display-name normalizer for name-based playlist matching.
///
/// On top of [`normalize_key`], strips leading country markers (`"US - "`),
/// decorative glyphs, parenthetical station tags (`"(KOMO)"`) and quality
/// markers (HD/FHD/UHD), then collapses whitespace. The regexes are compiled
/// once and reused across every entry of an index build.
pub struct NameNormalizer {
    country_prefix: Regex,
    glyphs: Regex,
    station_tag: Regex,
    quality: Regex,
    whitespace: Regex,
}

impl NameNormalizer {
    pub fn new() -> Self {
        Self {
            country_prefix: Regex::new(r"^[a-z]{2,3}\s*-\s*").unwrap(),
            glyphs: Regex::new(r"[◉•●]").unwrap(),
            station_tag: Regex::new(r"\(.*?\)").unwrap(),
            quality: Regex::new(r"(?i)\bhd\b|\bfhd\b|\buhd\b").unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
        }
    }

    pub fn normalize(&self, name: &str) -> String {
        let s = name.to_lowercase();
        let s = self.country_prefix.replace(&s, "");
        let s = self.glyphs.replace_all(&s, "");
        let s = self.station_tag.replace_all(&s, "");
        let s = self.quality.replace_all(&s, "");
        let s = self.whitespace.replace_all(&s, " ");
        s.trim().to_string()
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("News"), "News");
        assert_eq!(sanitize_filename("US | English"), "US_English");
        assert_eq!(sanitize_filename("Sports (1/3)"), "Sports_1_3");
        assert_eq!(sanitize_filename("__weird//name__"), "weird_name");
        assert_eq!(sanitize_filename("a.b-c_d"), "a.b-c_d");
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  CNN.us "), "cnn.us");
        assert_eq!(
            normalize_key("HTTP://Example.com/Stream.m3u8"),
            "http://example.com/stream.m3u8"
        );
    }

    #[test]
    fn test_name_normalizer() {
        let n = NameNormalizer::new();
        assert_eq!(n.normalize("US - CNN HD"), "cnn");
        assert_eq!(n.normalize("◉ ABC (KOMO) FHD"), "abc");
        assert_eq!(n.normalize("BBC One"), "bbc one");
        assert_eq!(n.normalize("  Discovery   UHD  "), "discovery");
        // "hd" embedded in a word must survive
        assert_eq!(n.normalize("HDTV Channel"), "hdtv channel");
    }
}
