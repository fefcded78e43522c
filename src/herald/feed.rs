use crate::error::HeraldError;
use crate::herald::config::HeraldConfig;
use crate::herald::model::FeedEntry;
use crate::herald::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::blocking::Client;

/// Only this many of the newest feed entries are considered per channel per
/// run; anything older is out of scope for notification.
pub const MAX_FEED_ENTRIES: usize = 5;

pub trait FeedSource {
    fn recent_entries(&self, channel_id: &str) -> Result<Vec<FeedEntry>, HeraldError>;
}

pub struct HttpFeedSource {
    client: Client,
    base_url: String,
}

impl HttpFeedSource {
    pub fn new(cfg: &HeraldConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.http_timeout)
            .build()
            .context("failed to build feed http client")?;
        Ok(Self {
            client,
            base_url: cfg.feed_base_url.clone(),
        })
    }
}

impl FeedSource for HttpFeedSource {
    fn recent_entries(&self, channel_id: &str) -> Result<Vec<FeedEntry>, HeraldError> {
        let url = format!(
            "{}/feeds/videos.xml?channel_id={}",
            self.base_url, channel_id
        );
        let unavailable = |reason: String| HeraldError::FeedUnavailable {
            channel_id: channel_id.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| unavailable(err.to_string()))?;
        if !response.status().is_success() {
            return Err(unavailable(format!("http status {}", response.status())));
        }
        let xml = response
            .text()
            .map_err(|err| unavailable(err.to_string()))?;

        parse_feed(&xml).map_err(|err| unavailable(format!("{err:#}")))
    }
}

#[derive(Debug, Default)]
struct PartialEntry {
    video_id: Option<String>,
    title: Option<String>,
    published: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
}

impl PartialEntry {
    fn into_entry(self) -> Option<FeedEntry> {
        Some(FeedEntry {
            video_id: self.video_id?,
            title: self.title?,
            published_at: self.published?,
            updated_at: self.updated?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Pull the first [`MAX_FEED_ENTRIES`] entries out of a channel Atom feed.
/// Only direct children of `<entry>` are read, so `<media:group>` metadata
/// cannot shadow the entry title. Entries missing a consumed field are
/// skipped, not fatal.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<PartialEntry> = None;
    // Depth below <entry>; consumed fields live at depth 1.
    let mut entry_depth = 0usize;
    let mut field: Option<&'static str> = None;

    loop {
        match reader.read_event().context("malformed feed xml")? {
            Event::Start(start) => {
                let name = start.local_name();
                let name = name.as_ref();
                if current.is_none() {
                    if name == b"entry" {
                        current = Some(PartialEntry::default());
                        entry_depth = 0;
                    }
                    continue;
                }
                entry_depth += 1;
                field = if entry_depth == 1 {
                    match name {
                        b"videoId" => Some("videoId"),
                        b"title" => Some("title"),
                        b"published" => Some("published"),
                        b"updated" => Some("updated"),
                        _ => None,
                    }
                } else {
                    None
                };
            }
            Event::Text(text) => {
                if let (Some(entry), Some(field_name)) = (current.as_mut(), field) {
                    let value = text.unescape().context("invalid feed text")?;
                    match field_name {
                        "videoId" => entry.video_id = Some(value.trim().to_string()),
                        "title" => entry.title = Some(value.trim().to_string()),
                        "published" => entry.published = parse_timestamp(&value),
                        "updated" => entry.updated = parse_timestamp(&value),
                        _ => {}
                    }
                }
            }
            Event::End(end) => {
                if current.is_some() && entry_depth == 0 && end.local_name().as_ref() == b"entry" {
                    let partial = current.take().unwrap_or_default();
                    match partial.into_entry() {
                        Some(entry) => entries.push(entry),
                        None => warn::emit(WarnEvent {
                            code: "FEED_ENTRY_INCOMPLETE",
                            stage: "feed-parse",
                            channel: "na",
                            video: "na",
                            reason: "missing-required-field",
                            err: "na",
                        }),
                    }
                    if entries.len() >= MAX_FEED_ENTRIES {
                        break;
                    }
                } else if current.is_some() {
                    entry_depth = entry_depth.saturating_sub(1);
                    field = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::{MAX_FEED_ENTRIES, parse_feed};
    use chrono::{TimeZone, Utc};

    fn entry_xml(video_id: &str, title: &str) -> String {
        format!(
            r#"<entry>
  <id>yt:video:{video_id}</id>
  <yt:videoId>{video_id}</yt:videoId>
  <title>{title}</title>
  <author><name>Chan</name><uri>https://example.test/chan</uri></author>
  <published>2024-01-01T00:00:00+00:00</published>
  <updated>2024-01-01T01:00:00+00:00</updated>
  <media:group><media:title>shadowing title</media:title></media:group>
</entry>"#
        )
    }

    fn feed_xml(entries: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015"
      xmlns:media="http://search.yahoo.com/mrss/"
      xmlns="http://www.w3.org/2005/Atom">
  <title>Channel feed</title>
  <updated>2024-01-02T00:00:00+00:00</updated>
{}
</feed>"#,
            entries.join("\n")
        )
    }

    #[test]
    fn parses_consumed_entry_fields() {
        let xml = feed_xml(&[entry_xml("vid-1", "First stream")]);
        let entries = parse_feed(&xml).expect("parse");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].video_id, "vid-1");
        assert_eq!(entries[0].title, "First stream");
        assert_eq!(
            entries[0].published_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap()
        );
        assert_eq!(
            entries[0].updated_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).single().unwrap()
        );
    }

    #[test]
    fn nested_media_title_does_not_shadow_entry_title() {
        let xml = feed_xml(&[entry_xml("vid-1", "Real title")]);
        let entries = parse_feed(&xml).expect("parse");
        assert_eq!(entries[0].title, "Real title");
    }

    #[test]
    fn caps_at_five_entries() {
        let many: Vec<String> = (0..8)
            .map(|i| entry_xml(&format!("vid-{i}"), &format!("Stream {i}")))
            .collect();
        let entries = parse_feed(&feed_xml(&many)).expect("parse");
        assert_eq!(entries.len(), MAX_FEED_ENTRIES);
        assert_eq!(entries[0].video_id, "vid-0");
        assert_eq!(entries[4].video_id, "vid-4");
    }

    #[test]
    fn incomplete_entry_is_skipped() {
        let broken = r#"<entry>
  <title>No video id</title>
  <published>2024-01-01T00:00:00+00:00</published>
  <updated>2024-01-01T01:00:00+00:00</updated>
</entry>"#
            .to_string();
        let xml = feed_xml(&[broken, entry_xml("vid-2", "Good entry")]);
        let entries = parse_feed(&xml).expect("parse");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].video_id, "vid-2");
    }

    #[test]
    fn empty_feed_yields_no_entries() {
        let entries = parse_feed(&feed_xml(&[])).expect("parse");
        assert!(entries.is_empty());
    }
}
