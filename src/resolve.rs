//! Turns whatever the user typed into a channel id
//!
//! Raw ids and `/channel/UC...` urls are handled locally, everything else (handles, custom urls,
//! video links) goes through yt-dlp

use std::sync::OnceLock;

use crate::{types::ChannelId, utils::normalize_channel_input, ytdlp::ChannelLookup};

use regex::Regex;
use url::Url;

const YOUTUBE_BASE: &str = "https://www.youtube.com";

fn handle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^@[A-Za-z0-9._-]+$").unwrap())
}

#[derive(Debug, PartialEq, Eq)]
pub struct Resolved {
    pub channel_id: ChannelId,
    pub name: String,
    pub source: String,
}

impl Resolved {
    /// Resolved without any lookup, so the only name we have is what the user typed
    fn local(channel_id: ChannelId, source: &str) -> Self {
        Self {
            channel_id,
            name: source.to_owned(),
            source: source.to_owned(),
        }
    }
}

pub fn resolve_channel(
    input: &str,
    explicit_id: Option<&str>,
    lookup: &dyn ChannelLookup,
) -> anyhow::Result<Resolved> {
    let source = normalize_channel_input(input);

    // An empty `--channel-id` counts as not given at all
    if let Some(explicit_id) = explicit_id.map(str::trim).filter(|id| !id.is_empty()) {
        let Some(channel_id) = ChannelId::parse(explicit_id) else {
            anyhow::bail!("Provided --channel-id does not look like a valid YouTube channel id.");
        };
        return Ok(Resolved::local(channel_id, source));
    }

    if let Some(channel_id) = ChannelId::parse(source) {
        return Ok(Resolved::local(channel_id, source));
    }

    if let Some(channel_id) = channel_id_from_url(source) {
        return Ok(Resolved::local(channel_id, source));
    }

    let lookup_url = if handle_re().is_match(source) {
        format!("{YOUTUBE_BASE}/{source}")
    } else {
        // Full urls and free text alike get handed over as-is
        source.to_owned()
    };

    tracing::info!(lookup_url, "Resolving channel through yt-dlp");
    let looked_up = lookup.lookup_channel(&lookup_url)?;
    let Some(channel_id) = ChannelId::parse(&looked_up.id) else {
        anyhow::bail!("Resolved channel id looks invalid: {}", looked_up.id);
    };

    Ok(Resolved {
        channel_id,
        name: looked_up.name,
        source: source.to_owned(),
    })
}

/// Pulls the id out of `https://(www.)youtube.com/channel/UC...` urls
///
/// The authority has to match exactly as typed. `Url` normalizes case, default ports, and
/// userinfo away, so it gets checked on the raw text instead
pub fn channel_id_from_url(raw: &str) -> Option<ChannelId> {
    if !matches!(raw_authority(raw), Some("youtube.com" | "www.youtube.com")) {
        return None;
    }

    let url = Url::parse(raw).ok()?;

    let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());
    match (segments.next(), segments.next()) {
        (Some("channel"), Some(id)) => ChannelId::parse(id),
        _ => None,
    }
}

/// Everything between `scheme://` and the start of the path, query, or fragment
fn raw_authority(raw: &str) -> Option<&str> {
    let (_, rest) = raw.split_once("://")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[..end])
}
