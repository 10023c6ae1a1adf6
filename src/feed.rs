//! Reading channel uploads off of YouTube's public Atom feed
//!
//! The feed only carries the latest ~15 uploads, which is plenty when looking back a day or so

use std::time::Duration;

use crate::{
    types::{Channel, ChannelId, Video},
    ytdlp::ChannelLookup,
};

use anyhow::Context;
use quick_xml::{
    events::{BytesStart, Event},
    name::{Namespace, ResolveResult},
    NsReader,
};
use reqwest::blocking::Client;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use url::Url;

const FEED_URL: &str = "https://www.youtube.com/feeds/videos.xml";
const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";
const SHORTS_PATH: &str = "/shorts/";

pub trait FeedSource {
    fn fetch(&self, channel_id: &ChannelId) -> anyhow::Result<String>;
}

pub struct YoutubeFeed {
    client: Client,
}

impl YoutubeFeed {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn url(channel_id: &ChannelId) -> anyhow::Result<Url> {
        let url = Url::parse_with_params(FEED_URL, &[("channel_id", channel_id.as_str())])?;
        Ok(url)
    }
}

impl FeedSource for YoutubeFeed {
    fn fetch(&self, channel_id: &ChannelId) -> anyhow::Result<String> {
        let url = Self::url(channel_id)?;
        tracing::debug!(%url, "Fetching feed");

        let body = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .text()?;
        Ok(body)
    }
}

/// The bits of an `<entry>` that we care about. Everything is kept raw until selection
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: String,
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Published,
}

/// Parses the top-level `<entry>`s from an Atom feed
///
/// Only direct children of each entry are read, so things like `<media:title>` nested in
/// `<media:group>` don't clobber the real title
pub fn parse_entries(xml: &str) -> anyhow::Result<Vec<FeedEntry>> {
    let mut reader = NsReader::from_str(xml);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut depth = 0_usize;
    let mut current: Option<FeedEntry> = None;
    let mut field: Option<Field> = None;
    // Only the first `<link>` of an entry counts
    let mut seen_link = false;

    loop {
        let (ns, event) = reader.read_resolved_event_into(&mut buf)?;
        let is_atom = matches!(ns, ResolveResult::Bound(Namespace(uri)) if uri == ATOM_NS);

        match event {
            Event::Start(start) => {
                depth += 1;
                match (depth, is_atom, start.local_name().as_ref()) {
                    (2, true, b"entry") => {
                        current = Some(FeedEntry::default());
                        seen_link = false;
                    }
                    (3, true, b"title") if current.is_some() => field = Some(Field::Title),
                    (3, true, b"published") if current.is_some() => {
                        field = Some(Field::Published)
                    }
                    (3, true, b"link") => {
                        if let Some(entry) = current.as_mut() {
                            read_link(&start, entry, &mut seen_link)?;
                        }
                    }
                    _ => {}
                }
            }
            // Self-closing elements never change the depth
            Event::Empty(start) => {
                if depth == 2 && is_atom && start.local_name().as_ref() == b"link" {
                    if let Some(entry) = current.as_mut() {
                        read_link(&start, entry, &mut seen_link)?;
                    }
                }
            }
            Event::Text(text) => {
                if let (Some(field), Some(entry)) = (field, current.as_mut()) {
                    push_field(entry, field, &text.unescape()?);
                }
            }
            Event::CData(cdata) => {
                if let (Some(field), Some(entry)) = (field, current.as_mut()) {
                    push_field(entry, field, &String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::End(_) => {
                if depth == 3 {
                    field = None;
                } else if depth == 2 {
                    entries.extend(current.take());
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn read_link(
    start: &BytesStart,
    entry: &mut FeedEntry,
    seen_link: &mut bool,
) -> anyhow::Result<()> {
    if *seen_link {
        return Ok(());
    }
    *seen_link = true;

    if let Some(href) = start.try_get_attribute("href")? {
        entry.link = href.unescape_value()?.into_owned();
    }
    Ok(())
}

fn push_field(entry: &mut FeedEntry, field: Field, text: &str) {
    match field {
        Field::Title => entry.title.push_str(text),
        Field::Published => entry.published.push_str(text),
    }
}

pub fn parse_published(published: &str) -> anyhow::Result<OffsetDateTime> {
    let published = OffsetDateTime::parse(published, &Rfc3339)
        .with_context(|| format!("Invalid published timestamp: {published}"))?;
    Ok(published.to_offset(time::UtcOffset::UTC))
}

/// Finds the newest upload at or after `cutoff` that isn't a short
///
/// Feeds list the newest entries first, so the first one to pass wins
pub fn most_recent_full_length(
    entries: &[FeedEntry],
    cutoff: OffsetDateTime,
) -> anyhow::Result<Option<(&FeedEntry, OffsetDateTime)>> {
    for entry in entries {
        // Only a missing timestamp gets skipped, a blank one is still malformed
        if entry.published.is_empty() {
            continue;
        }
        let published = parse_published(&entry.published)?;
        if published < cutoff {
            continue;
        }
        if entry.link.is_empty() || entry.link.contains(SHORTS_PATH) {
            continue;
        }

        return Ok(Some((entry, published)));
    }

    Ok(None)
}

#[derive(Default)]
pub struct Scan {
    pub videos: Vec<Video>,
    pub failures: Vec<String>,
}

/// Checks every channel's feed once, in order
pub fn scan<'a>(
    channels: impl IntoIterator<Item = &'a Channel>,
    cutoff: OffsetDateTime,
    feed: &dyn FeedSource,
    lookup: &dyn ChannelLookup,
) -> Scan {
    let mut scan = Scan::default();

    for channel in channels {
        match recent_video(channel, cutoff, feed, lookup) {
            Ok(Some(video)) => {
                tracing::info!(channel = %channel, ?video, "Found recent video");
                scan.videos.push(video);
            }
            Ok(None) => tracing::debug!(channel = %channel, "No recent videos"),
            Err(err) => {
                tracing::debug!(channel = %channel, %err, "Failed checking channel");
                scan.failures.push(format!("{channel}: {err:#}"));
            }
        }
    }

    scan.videos.sort_by(|a, b| b.published.cmp(&a.published));
    scan
}

fn recent_video(
    channel: &Channel,
    cutoff: OffsetDateTime,
    feed: &dyn FeedSource,
    lookup: &dyn ChannelLookup,
) -> anyhow::Result<Option<Video>> {
    let xml = feed.fetch(&channel.channel_id)?;
    let entries = parse_entries(&xml)?;

    let Some((entry, published)) = most_recent_full_length(&entries, cutoff)? else {
        return Ok(None);
    };

    Ok(Some(Video {
        channel_name: channel.name.clone(),
        title: entry.title.trim().to_owned(),
        url: entry.link.clone(),
        duration: lookup.video_duration(&entry.link),
        published,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use crate::ytdlp::LookedUpChannel;

    use time::macros::datetime;

    const ID_A: &str = "UCaaaaaaaaaaaaaaaaaaaaaa";
    const ID_B: &str = "UCbbbbbbbbbbbbbbbbbbbbbb";
    const ID_C: &str = "UCcccccccccccccccccccccc";

    fn entry_xml(title: &str, link: &str, published: &str) -> String {
        format!(
            r#"
 <entry>
  <id>yt:video:x</id>
  <yt:videoId>x</yt:videoId>
  <title>{title}</title>
  <link rel="alternate" href="{link}"/>
  <author><name>Someone</name></author>
  <published>{published}</published>
  <updated>{published}</updated>
  <media:group>
   <media:title>not the title</media:title>
   <media:content url="https://www.youtube.com/v/x" type="application/x-shockwave-flash"/>
  </media:group>
 </entry>"#
        )
    }

    fn feed_xml(entries: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
 <link rel="self" href="http://www.youtube.com/feeds/videos.xml?channel_id={ID_A}"/>
 <id>yt:channel:aaaaaaaaaaaaaaaaaaaaaa</id>
 <title>Channel Title</title>
 <published>2010-01-01T00:00:00+00:00</published>
{}
</feed>"#,
            entries.concat()
        )
    }

    #[test]
    fn parse() {
        let xml = feed_xml(&[
            entry_xml(
                "  Fish &amp; Chips  ",
                "https://www.youtube.com/watch?v=one",
                "2024-05-01T12:00:00+00:00",
            ),
            entry_xml(
                "Short",
                "https://www.youtube.com/shorts/two",
                "2024-04-30T12:00:00+00:00",
            ),
        ]);

        let entries = parse_entries(&xml).unwrap();
        assert_eq!(
            entries,
            [
                FeedEntry {
                    title: "  Fish & Chips  ".to_owned(),
                    link: "https://www.youtube.com/watch?v=one".to_owned(),
                    published: "2024-05-01T12:00:00+00:00".to_owned(),
                },
                FeedEntry {
                    title: "Short".to_owned(),
                    link: "https://www.youtube.com/shorts/two".to_owned(),
                    published: "2024-04-30T12:00:00+00:00".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn entries_need_the_atom_namespace() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:o="urn:other">
            <o:entry><title>Wrong ns</title></o:entry>
            <entry><title>Right ns</title><link href="first"/><link href="second"/></entry>
        </feed>"#;

        let entries = parse_entries(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Right ns");
        assert_eq!(entries[0].link, "first");
        assert_eq!(entries[0].published, "");
    }

    #[test]
    fn malformed_xml() {
        assert!(parse_entries("<feed><entry></feed>").is_err());
    }

    fn entry(link: &str, published: &str) -> FeedEntry {
        FeedEntry {
            title: link.to_owned(),
            link: link.to_owned(),
            published: published.to_owned(),
        }
    }

    #[test]
    fn selection() {
        let cutoff = datetime!(2024-05-01 00:00 UTC);
        let entries = [
            entry("no-published", ""),
            entry("https://www.youtube.com/shorts/x", "2024-05-03T00:00:00+00:00"),
            entry("", "2024-05-03T00:00:00+00:00"),
            // Out of order entries older than the cutoff are skipped rather than ending the search
            entry("too-old", "2024-04-30T23:59:59+00:00"),
            entry("winner", "2024-05-02T10:00:00-02:00"),
            entry("runner-up", "2024-05-02T00:00:00+00:00"),
        ];

        let (found, published) = most_recent_full_length(&entries, cutoff).unwrap().unwrap();
        assert_eq!(found.link, "winner");
        assert_eq!(published, datetime!(2024-05-02 12:00 UTC));

        // Right on the cutoff still counts
        let entries = [entry("edge", "2024-05-01T00:00:00Z")];
        assert!(most_recent_full_length(&entries, cutoff).unwrap().is_some());

        let entries = [entry("old", "2024-04-01T00:00:00Z")];
        assert!(most_recent_full_length(&entries, cutoff).unwrap().is_none());
    }

    #[test]
    fn bad_timestamp_is_an_error() {
        let cutoff = datetime!(2024-05-01 00:00 UTC);
        let entries = [entry("bad", "yesterday"), entry("good", "2024-05-02T00:00:00Z")];

        let err = most_recent_full_length(&entries, cutoff).unwrap_err();
        insta::assert_snapshot!(err, @"Invalid published timestamp: yesterday");
    }

    #[test]
    fn blank_timestamp_is_an_error() {
        let cutoff = datetime!(2024-05-01 00:00 UTC);
        let entries = [entry("blank", "   "), entry("good", "2024-05-02T00:00:00Z")];

        let err = most_recent_full_length(&entries, cutoff).unwrap_err();
        assert!(err.to_string().starts_with("Invalid published timestamp"));
        assert!(parse_published(" 2024-05-02T00:00:00Z").is_err());
    }

    struct FakeFeeds(HashMap<&'static str, anyhow::Result<String>>);

    impl FeedSource for FakeFeeds {
        fn fetch(&self, channel_id: &ChannelId) -> anyhow::Result<String> {
            match self.0.get(channel_id.as_str()) {
                Some(Ok(xml)) => Ok(xml.clone()),
                Some(Err(err)) => Err(anyhow::anyhow!("{err}")),
                None => anyhow::bail!("no feed"),
            }
        }
    }

    struct FixedDuration;

    impl ChannelLookup for FixedDuration {
        fn lookup_channel(&self, _: &str) -> anyhow::Result<LookedUpChannel> {
            unreachable!()
        }

        fn video_duration(&self, url: &str) -> String {
            format!("dur:{url}")
        }
    }

    fn channel(id: &str, name: &str) -> Channel {
        Channel::new(
            ChannelId::parse(id).unwrap(),
            name.to_owned(),
            id.to_owned(),
        )
    }

    #[test]
    fn scan_sorts_and_collects_failures() {
        let cutoff = datetime!(2024-05-01 00:00 UTC);
        let feeds = FakeFeeds(HashMap::from([
            (
                ID_A,
                Ok(feed_xml(&[entry_xml(
                    "Older",
                    "https://www.youtube.com/watch?v=a",
                    "2024-05-01T06:00:00+00:00",
                )])),
            ),
            (
                ID_B,
                Ok(feed_xml(&[entry_xml(
                    "Newer",
                    "https://www.youtube.com/watch?v=b",
                    "2024-05-02T06:00:00+00:00",
                )])),
            ),
            (ID_C, Err(anyhow::anyhow!("connection refused"))),
        ]));
        let channels = [
            channel(ID_A, "A"),
            channel(ID_B, "B"),
            channel(ID_C, "C"),
            channel("UCdddddddddddddddddddddd", "D"),
        ];

        let Scan { videos, failures } = scan(&channels, cutoff, &feeds, &FixedDuration);

        let summary: Vec<_> = videos
            .iter()
            .map(|video| (video.channel_name.as_str(), video.title.as_str(), video.duration.as_str()))
            .collect();
        assert_eq!(
            summary,
            [
                ("B", "Newer", "dur:https://www.youtube.com/watch?v=b"),
                ("A", "Older", "dur:https://www.youtube.com/watch?v=a"),
            ]
        );
        assert_eq!(
            failures,
            [
                format!("C ({ID_C}): connection refused"),
                "D (UCdddddddddddddddddddddd): no feed".to_owned(),
            ]
        );
    }

    #[test]
    fn feed_url() {
        let id = ChannelId::parse(ID_A).unwrap();
        insta::assert_snapshot!(
            YoutubeFeed::url(&id).unwrap(),
            @"https://www.youtube.com/feeds/videos.xml?channel_id=UCaaaaaaaaaaaaaaaaaaaaaa"
        );
    }
}
