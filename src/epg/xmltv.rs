//! XMLTV guide parsing.
//!
//! A document without a `<tv>` root is a fatal parse error. Malformed
//! sub-elements degrade gracefully: a programme with a missing or
//! unparseable start/stop is still emitted, with `None` for that bound.

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::{AppError, Result};
use crate::models::{XmltvChannel, XmltvDocument, XmltvProgramme};

#[derive(Clone, Copy, PartialEq)]
enum TextTarget {
    DisplayName,
    Title,
    Desc,
}

/// Parse XMLTV markup into channel and programme records.
pub fn parse_xmltv(xml: &str) -> Result<XmltvDocument> {
    let mut reader = Reader::from_str(xml);
    let mut doc = XmltvDocument::default();

    let mut saw_root = false;
    let mut channel: Option<XmltvChannel> = None;
    let mut programme: Option<XmltvProgramme> = None;
    let mut target: Option<TextTarget> = None;

    loop {
        match reader.read_event() {
            Err(e) => {
                return Err(AppError::parse(format!(
                    "XMLTV syntax error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"tv" => saw_root = true,
                b"channel" => {
                    channel = Some(XmltvChannel {
                        id: attr(&e, b"id").unwrap_or_default(),
                        display_name: String::new(),
                        icon: None,
                    });
                }
                b"display-name" if channel.is_some() => target = Some(TextTarget::DisplayName),
                b"icon" => {
                    if let (Some(ch), Some(src)) = (channel.as_mut(), attr(&e, b"src")) {
                        ch.icon.get_or_insert(src);
                    }
                }
                b"programme" => {
                    programme = Some(XmltvProgramme {
                        channel: attr(&e, b"channel").unwrap_or_default(),
                        start: attr(&e, b"start").and_then(|s| parse_xmltv_datetime(&s)),
                        stop: attr(&e, b"stop").and_then(|s| parse_xmltv_datetime(&s)),
                        title: String::new(),
                        desc: String::new(),
                    });
                }
                b"title" if programme.is_some() => target = Some(TextTarget::Title),
                b"desc" if programme.is_some() => target = Some(TextTarget::Desc),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"tv" => saw_root = true,
                b"icon" => {
                    if let (Some(ch), Some(src)) = (channel.as_mut(), attr(&e, b"src")) {
                        ch.icon.get_or_insert(src);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(tgt) = target {
                    let text = t.unescape().unwrap_or_default();
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    match tgt {
                        TextTarget::DisplayName => {
                            if let Some(ch) = channel.as_mut() {
                                // First non-empty display-name wins.
                                if ch.display_name.is_empty() {
                                    ch.display_name = text.to_string();
                                }
                            }
                        }
                        TextTarget::Title => {
                            if let Some(p) = programme.as_mut() {
                                if p.title.is_empty() {
                                    p.title = text.to_string();
                                }
                            }
                        }
                        TextTarget::Desc => {
                            if let Some(p) = programme.as_mut() {
                                if p.desc.is_empty() {
                                    p.desc = text.to_string();
                                }
                            }
                        }
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"channel" => {
                    if let Some(ch) = channel.take() {
                        doc.channels.push(ch);
                    }
                }
                b"programme" => {
                    if let Some(p) = programme.take() {
                        doc.programmes.push(p);
                    }
                }
                b"display-name" | b"title" | b"desc" => target = None,
                _ => {}
            },
            Ok(_) => {}
        }
    }

    if !saw_root {
        return Err(AppError::parse(
            "document is not XMLTV: missing <tv> root element",
        ));
    }

    Ok(doc)
}

fn attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// Parse an XMLTV datetime: `YYYYMMDDHHMMSS` with an optional `+-HHMM`
/// offset (`20260123180000 -0800`). No offset means UTC. Returns `None`
/// when the value does not match.
pub fn parse_xmltv_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    for format in ["%Y%m%d%H%M%S %z", "%Y%m%d%H%M%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    NaiveDateTime::parse_from_str(value, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tv generator-info-name="test">
  <channel id="cnn.us">
    <display-name>CNN</display-name>
    <icon src="http://logos/cnn.png"/>
  </channel>
  <channel id="bbc.uk">
    <display-name>BBC One</display-name>
  </channel>
  <programme start="20260123180000 +0000" stop="20260123190000 +0000" channel="cnn.us">
    <title>Evening News</title>
    <desc>Headlines &amp; analysis</desc>
  </programme>
  <programme start="garbage" channel="cnn.us">
    <title>Broken Slot</title>
  </programme>
</tv>"#;

    #[test]
    fn test_parses_channels_and_programmes() {
        let doc = parse_xmltv(SAMPLE).unwrap();
        assert_eq!(doc.channels.len(), 2);
        assert_eq!(doc.channels[0].id, "cnn.us");
        assert_eq!(doc.channels[0].display_name, "CNN");
        assert_eq!(doc.channels[0].icon.as_deref(), Some("http://logos/cnn.png"));

        assert_eq!(doc.programmes.len(), 2);
        assert_eq!(doc.programmes[0].title, "Evening News");
        assert_eq!(doc.programmes[0].desc, "Headlines & analysis");
        assert!(doc.programmes[0].start.is_some());
        assert!(doc.programmes[0].stop.is_some());
    }

    #[test]
    fn test_malformed_dates_degrade_to_none() {
        let doc = parse_xmltv(SAMPLE).unwrap();
        let broken = &doc.programmes[1];
        assert_eq!(broken.title, "Broken Slot");
        assert!(broken.start.is_none());
        assert!(broken.stop.is_none());
    }

    #[test]
    fn test_missing_tv_root_is_fatal() {
        let err = parse_xmltv("<guide><channel id=\"x\"/></guide>").unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));
    }

    #[test]
    fn test_datetime_offset_is_honored() {
        let dt = parse_xmltv_datetime("20260123180000 -0800").unwrap();
        assert_eq!(dt.hour(), 2); // 18:00 -0800 is 02:00 UTC next day
        let utc = parse_xmltv_datetime("20260123180000").unwrap();
        assert_eq!(utc.hour(), 18);
    }

    #[test]
    fn test_datetime_rejects_garbage() {
        assert!(parse_xmltv_datetime("not-a-date").is_none());
        assert!(parse_xmltv_datetime("2026012318").is_none());
    }
}
