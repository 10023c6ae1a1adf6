use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    types::{Channel, ChannelId},
    utils::normalize_channel_input,
};

use anyhow::Context;
use smartstring::alias::String as SmallString;

const EMPTY_STORE: &str = "[]\n";

/// The list of tracked channels, backed by a JSON array on disk
pub struct ChannelStore {
    path: PathBuf,
    channels: Vec<Channel>,
}

impl ChannelStore {
    /// Loads the store at `path`, creating an empty one if it doesn't exist yet
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed creating config dir {}", parent.display()))?;
        }
        if !path.exists() {
            tracing::info!(path = %path.display(), "Creating empty channels file");
            fs::write(path, EMPTY_STORE)
                .with_context(|| format!("Failed writing {}", path.display()))?;
        }

        tracing::debug!(path = %path.display(), "Reading channels at path");
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed reading {}", path.display()))?;
        let channels = serde_json::from_str(&text)
            .with_context(|| format!("Malformed channels file {}", path.display()))?;

        Ok(Self {
            path: path.to_owned(),
            channels,
        })
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let mut text = serde_json::to_string_pretty(&self.channels)?;
        text.push('\n');
        fs::write(&self.path, text)
            .with_context(|| format!("Failed writing {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), num = self.channels.len(), "Saved channels");

        Ok(())
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Finds a channel by id, by the input it was added with, or by (case-insensitive) name
    pub fn find(&self, target: &str) -> Option<&Channel> {
        let target = normalize_channel_input(target);
        let lowered = target.to_lowercase();

        self.channels.iter().find(|channel| {
            channel.channel_id.as_str() == target
                || normalize_channel_input(&channel.source) == target
                || normalize_channel_input(&channel.name).to_lowercase() == lowered
        })
    }

    pub fn get(&self, id: &ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|channel| &channel.channel_id == id)
    }

    pub fn push(&mut self, channel: Channel) {
        self.channels.push(channel);
    }

    /// Removes every channel with `id`, returning how many were dropped
    pub fn remove_id(&mut self, id: &ChannelId) -> usize {
        let before = self.channels.len();
        self.channels.retain(|channel| &channel.channel_id != id);
        before - self.channels.len()
    }

    /// Adds the trimmed, non-empty `tags` that aren't already present. Returns the newly added
    /// tags in the order they were given
    pub fn add_tags<S: AsRef<str>>(&mut self, id: &ChannelId, tags: &[S]) -> Vec<SmallString> {
        let Some(channel) = self.get_mut(id) else {
            return Vec::new();
        };

        let mut added = Vec::new();
        for tag in clean_tags(tags) {
            if channel.tags.insert(tag.clone()) {
                added.push(tag);
            }
        }

        added
    }

    /// Removes `tags` from the channel, returning the ones that were actually present (sorted)
    pub fn remove_tags(
        &mut self,
        id: &ChannelId,
        tags: &BTreeSet<SmallString>,
    ) -> Vec<SmallString> {
        let Some(channel) = self.get_mut(id) else {
            return Vec::new();
        };

        let removed: Vec<_> = channel.tags.intersection(tags).cloned().collect();
        channel.tags.retain(|tag| !tags.contains(tag));

        removed
    }

    pub fn all_tags(&self) -> BTreeSet<&str> {
        self.channels
            .iter()
            .flat_map(|channel| channel.tags.iter().map(|tag| tag.as_str()))
            .collect()
    }

    fn get_mut(&mut self, id: &ChannelId) -> Option<&mut Channel> {
        self.channels
            .iter_mut()
            .find(|channel| &channel.channel_id == id)
    }
}

/// Trims tags and drops the empty ones, keeping the original order
pub fn clean_tags<S: AsRef<str>>(tags: &[S]) -> Vec<SmallString> {
    tags.iter()
        .map(|tag| tag.as_ref().trim())
        .filter(|tag| !tag.is_empty())
        .map(SmallString::from)
        .collect()
}
