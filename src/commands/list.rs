use std::io::Write;

use super::Outcome;
use crate::{
    config::Settings,
    feed::{self, FeedSource, Scan},
    store::ChannelStore,
    types::{Channel, Video},
    ytdlp::ChannelLookup,
};

use regex::Regex;
use time::{macros::format_description, Duration, OffsetDateTime, UtcOffset};

/// Keeps the cutoff math well clear of `OffsetDateTime`'s range
pub const MAX_HOURS: f64 = 24.0 * 365.0 * 100.0;

pub struct ListArgs<'a> {
    pub hours: f64,
    pub tag_regex: Option<&'a str>,
}

/// `feed` is taken by value so it can be dropped before timestamps get localized. The local
/// offset lookup refuses to run while the HTTP client's thread is still alive
pub fn run(
    settings: &Settings,
    feed: Box<dyn FeedSource>,
    lookup: &dyn ChannelLookup,
    local_offset: &dyn Fn(OffsetDateTime) -> UtcOffset,
    out: &mut dyn Write,
    err: &mut dyn Write,
    ListArgs { hours, tag_regex }: ListArgs<'_>,
) -> anyhow::Result<Outcome> {
    let store = ChannelStore::load(&settings.channels_path)?;
    if store.is_empty() {
        writeln!(out, "No channels configured. Add one with `add`.")?;
        return Ok(Outcome::Failure);
    }

    let channels: Vec<&Channel> = match tag_regex {
        Some(pattern) => {
            let re = match Regex::new(pattern) {
                Ok(re) => re,
                Err(regex_err) => {
                    writeln!(err, "Invalid --tag-regex: {regex_err}")?;
                    return Ok(Outcome::InvalidPattern);
                }
            };
            let matching = filter_by_tag(store.channels(), &re);
            if matching.is_empty() {
                writeln!(out, "No channels matched tag regex: {pattern}")?;
                return Ok(Outcome::Failure);
            }
            matching
        }
        None => store.channels().iter().collect(),
    };

    let cutoff = OffsetDateTime::now_utc() - Duration::seconds_f64(hours * 3600.0);
    tracing::info!(num_channels = channels.len(), %cutoff, "Checking feeds");

    let Scan { videos, failures } = feed::scan(channels, cutoff, feed.as_ref(), lookup);
    drop(feed);

    if videos.is_empty() {
        writeln!(out, "No full-length videos in the last {} hours.", format_hours(hours))?;
    }
    for video in &videos {
        let offset = local_offset(video.published);
        writeln!(out, "{}", format_headline(video, offset)?)?;
        writeln!(out, "{}", video.url)?;
    }

    if !failures.is_empty() {
        writeln!(err, "\nErrors:")?;
        for failure in &failures {
            writeln!(err, "- {failure}")?;
        }
    }

    Ok(Outcome::Success)
}

/// Channels with at least one tag that `re` matches somewhere in
pub fn filter_by_tag<'a>(channels: &'a [Channel], re: &Regex) -> Vec<&'a Channel> {
    channels
        .iter()
        .filter(|channel| channel.tags.iter().any(|tag| re.is_match(tag)))
        .collect()
}

pub fn format_headline(video: &Video, local_offset: UtcOffset) -> anyhow::Result<String> {
    let timestamp = video
        .published
        .to_offset(local_offset)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))?;
    Ok(format!(
        "[{timestamp}] {} [{}] - {}",
        video.channel_name, video.duration, video.title
    ))
}

/// Whole hours keep a trailing `.0` (`24.0`), fractional ones print as-is (`1.5`)
pub fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{hours:.1}")
    } else {
        hours.to_string()
    }
}

/// Clap value parser for `--hours`
pub fn parse_hours(s: &str) -> Result<f64, String> {
    let hours: f64 = s.parse().map_err(|err| format!("{err}"))?;
    if !hours.is_finite() || !(0.0..=MAX_HOURS).contains(&hours) {
        return Err(format!("must be a number of hours between 0 and {MAX_HOURS}"));
    }
    Ok(hours)
}
