use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use directories::BaseDirs;

pub const DEFAULT_FEED_TIMEOUT_SECS: u64 = 20;

/// Everything the commands need to know about where things live
#[derive(Debug)]
pub struct Settings {
    pub channels_path: PathBuf,
    pub yt_dlp: PathBuf,
    pub feed_timeout: Duration,
}

impl Settings {
    pub fn new(
        config: Option<&Path>,
        yt_dlp: PathBuf,
        feed_timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let channels_path = match config {
            Some(path) => expand_path(path)?,
            None => default_channels_path()?,
        };
        tracing::debug!(channels_path = %channels_path.display(), "Using channels file");

        Ok(Self {
            channels_path,
            yt_dlp,
            feed_timeout: Duration::from_secs(feed_timeout_secs),
        })
    }
}

/// Clap value parser for `--feed-timeout`. A zero timeout would fail every request instantly
pub fn parse_feed_timeout(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("must be at least 1 second".to_owned()),
        Ok(secs) => Ok(secs),
        Err(err) => Err(err.to_string()),
    }
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let dirs = BaseDirs::new().context("Unable to determine the home directory")?;
    Ok(dirs.home_dir().to_owned())
}

/// `~/.config/yt-channel-watch/channels.json` on every platform
pub fn default_channels_path() -> anyhow::Result<PathBuf> {
    Ok(home_dir()?
        .join(".config")
        .join("yt-channel-watch")
        .join("channels.json"))
}

/// Expands a leading `~` and anchors relative paths to the current dir
pub fn expand_path(path: &Path) -> anyhow::Result<PathBuf> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => home_dir()?.join(rest),
        Err(_) => path.to_owned(),
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(env::current_dir()?.join(expanded))
    }
}
