//! M3U playlist parsing and rendering.
//!
//! Parsing never fails: malformed attributes are simply absent and an
//! `#EXTINF` line with no following URL line is dropped. Rendering is the
//! inverse used by the manifest writer; parsing a rendered bucket yields the
//! same entry set back (modulo attribute ordering).

use crate::models::PlaylistEntry;

/// Parse raw playlist text into an ordered list of entries.
///
/// An `#EXTINF` line opens a pending entry; the next non-empty,
/// non-comment line is bound as its URL. Blank lines and unrelated comments
/// are skipped.
pub fn parse_m3u(content: &str) -> Vec<PlaylistEntry> {
    let mut entries = Vec::new();
    let mut pending: Option<PlaylistEntry> = None;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("#EXTINF") {
            pending = Some(parse_extinf_line(line));
        } else if line.starts_with('#') {
            // #EXTM3U header or other directives
            continue;
        } else if let Some(mut entry) = pending.take() {
            entry.url = line.to_string();
            entries.push(entry);
        }
    }

    entries
}

/// Rebuild playlist text from entries, omitting attributes that are empty.
pub fn render_m3u(entries: &[PlaylistEntry]) -> String {
    let mut out = String::from("#EXTM3U\n");

    for entry in entries {
        let mut attrs = Vec::new();
        for (key, value) in [
            ("tvg-id", &entry.tvg_id),
            ("tvg-name", &entry.tvg_name),
            ("tvg-logo", &entry.tvg_logo),
            ("group-title", &entry.group_title),
            ("tvg-language", &entry.tvg_language),
            ("tvg-country", &entry.tvg_country),
        ] {
            if !value.is_empty() {
                attrs.push(format!("{}=\"{}\"", key, value));
            }
        }

        let name = if entry.name.is_empty() {
            "Unknown"
        } else {
            &entry.name
        };
        if attrs.is_empty() {
            out.push_str(&format!("#EXTINF:-1,{}\n", name));
        } else {
            out.push_str(&format!("#EXTINF:-1 {},{}\n", attrs.join(" "), name));
        }
        out.push_str(&entry.url);
        out.push('\n');
    }

    out
}

fn parse_extinf_line(line: &str) -> PlaylistEntry {
    // The display name sits after the last comma outside quoted attribute
    // values.
    let mut in_quotes = false;
    let mut name_split = None;
    for (i, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => name_split = Some(i),
            _ => {}
        }
    }

    let (attr_part, name) = match name_split {
        Some(i) => (&line[..i], line[i + 1..].trim()),
        None => (line, ""),
    };
    let name = if name.is_empty() { "Unknown" } else { name };

    let mut entry = PlaylistEntry {
        name: name.to_string(),
        url: String::new(),
        group_title: String::new(),
        tvg_id: String::new(),
        tvg_name: String::new(),
        tvg_logo: String::new(),
        tvg_language: String::new(),
        tvg_country: String::new(),
    };

    for (key, value) in parse_attributes(attr_part) {
        match key.as_str() {
            "tvg-id" => entry.tvg_id = value,
            "tvg-name" => entry.tvg_name = value,
            "tvg-logo" => entry.tvg_logo = value,
            "group-title" => entry.group_title = value,
            "tvg-language" => entry.tvg_language = value,
            "tvg-country" => entry.tvg_country = value,
            _ => {}
        }
    }

    entry
}

/// Tolerant `key="value"` scanner. Attribute order is irrelevant, unknown
/// keys are passed through to the caller, tokens without a `=` (like the
/// `-1` duration) are discarded at the next whitespace boundary.
fn parse_attributes(segment: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut key = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut in_quotes = false;

    for ch in segment.chars() {
        match ch {
            '"' if in_value => {
                if in_quotes {
                    attrs.push((key.trim().to_string(), std::mem::take(&mut value)));
                    key.clear();
                    in_value = false;
                    in_quotes = false;
                } else {
                    in_quotes = true;
                }
            }
            '=' if !in_value => in_value = true,
            c if c.is_whitespace() && !in_quotes => {
                if in_value && !value.is_empty() {
                    // unquoted value terminated by whitespace
                    attrs.push((key.trim().to_string(), std::mem::take(&mut value)));
                }
                key.clear();
                in_value = false;
            }
            c => {
                if in_value {
                    value.push(c);
                } else {
                    key.push(c);
                }
            }
        }
    }

    if in_value && !value.is_empty() {
        attrs.push((key.trim().to_string(), value));
    }

    attrs
}
