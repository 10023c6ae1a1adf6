use std::{collections::BTreeSet, fmt, sync::OnceLock};

use crate::utils;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smartstring::alias::String as SmallString;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

const DEBUG_FIELD_TRUNCATE_LEN: usize = 60;

fn channel_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^UC[0-9A-Za-z_-]{20,}$").unwrap())
}

/// A YouTube channel id (`UC` followed by at least 20 id chars)
///
/// Ids coming back out of the channels file aren't re-validated. Whatever got stored is what we
/// query the feed with
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(SmallString);

impl ChannelId {
    pub fn parse(s: &str) -> Option<Self> {
        Self::is_valid(s).then(|| Self(SmallString::from(s)))
    }

    pub fn is_valid(s: &str) -> bool {
        channel_id_re().is_match(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawChannel")]
pub struct Channel {
    pub channel_id: ChannelId,
    pub name: String,
    pub source: String,
    pub tags: BTreeSet<SmallString>,
}

impl Channel {
    pub fn new(channel_id: ChannelId, name: String, source: String) -> Self {
        Self {
            channel_id,
            name,
            source,
            tags: BTreeSet::new(),
        }
    }

    pub fn format_tags(&self) -> String {
        if self.tags.is_empty() {
            "-".to_owned()
        } else {
            join(&self.tags)
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.channel_id)
    }
}

pub fn join<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The on-disk shape of a channel before cleanup. Hand-edited files can be missing `source` or
/// have junk in `tags`
#[derive(Deserialize)]
struct RawChannel {
    channel_id: String,
    name: String,
    source: Option<String>,
    #[serde(default)]
    tags: Value,
}

impl From<RawChannel> for Channel {
    fn from(
        RawChannel {
            channel_id,
            name,
            source,
            tags,
        }: RawChannel,
    ) -> Self {
        let tags = match tags {
            Value::Array(values) => values
                .into_iter()
                .map(|value| match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .filter_map(|tag| {
                    let tag = tag.trim();
                    (!tag.is_empty()).then(|| SmallString::from(tag))
                })
                .collect(),
            _ => BTreeSet::new(),
        };
        let source = source.unwrap_or_else(|| channel_id.clone());

        Self {
            channel_id: ChannelId(SmallString::from(channel_id)),
            name,
            source,
            tags,
        }
    }
}

#[derive(Clone)]
pub struct Video {
    pub channel_name: String,
    pub title: String,
    pub url: String,
    pub duration: String,
    pub published: OffsetDateTime,
}

impl fmt::Debug for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            channel_name,
            title,
            url,
            duration,
            published,
        } = &self;

        let mut debug_struct = f.debug_struct("Video");
        debug_struct.field("channel_name", channel_name);

        let truncated_title = utils::truncate_str(title, DEBUG_FIELD_TRUNCATE_LEN);
        debug_struct.field("title", &truncated_title);

        debug_struct.field("url", url);
        debug_struct.field("duration", duration);
        match published.format(&Rfc3339) {
            Ok(published) => debug_struct.field("published", &published),
            Err(_) => debug_struct.field("published", published),
        };

        debug_struct.finish()
    }
}
