//! Tag bookkeeping: `tag-add`, `tag-remove`, and `tags`

use std::{collections::BTreeSet, io::Write};

use super::Outcome;
use crate::{
    config::Settings,
    store::{self, ChannelStore},
    types,
};

pub fn add(
    settings: &Settings,
    out: &mut dyn Write,
    target: &str,
    tags: &[String],
) -> anyhow::Result<Outcome> {
    let mut store = ChannelStore::load(&settings.channels_path)?;
    let Some(channel) = store.find(target) else {
        return super::no_match(out);
    };
    let (channel_id, name) = (channel.channel_id.clone(), channel.name.clone());

    let added = store.add_tags(&channel_id, tags);
    // Saved even when nothing changed, which also rewrites a hand-edited file in canonical form
    store.save()?;

    if added.is_empty() {
        writeln!(out, "No new tags added.")?;
    } else {
        writeln!(out, "Added tag(s) to {name}: {}", types::join(&added))?;
    }

    Ok(Outcome::Success)
}

pub fn remove(
    settings: &Settings,
    out: &mut dyn Write,
    target: &str,
    tags: &[String],
) -> anyhow::Result<Outcome> {
    let mut store = ChannelStore::load(&settings.channels_path)?;
    let Some(channel) = store.find(target) else {
        return super::no_match(out);
    };
    let (channel_id, name) = (channel.channel_id.clone(), channel.name.clone());

    let targets: BTreeSet<_> = store::clean_tags(tags).into_iter().collect();
    if targets.is_empty() {
        writeln!(out, "No tags provided.")?;
        return Ok(Outcome::Failure);
    }

    let removed = store.remove_tags(&channel_id, &targets);
    store.save()?;

    if removed.is_empty() {
        writeln!(out, "No matching tags removed.")?;
    } else {
        writeln!(out, "Removed tag(s) from {name}: {}", types::join(&removed))?;
    }

    Ok(Outcome::Success)
}

pub fn list(settings: &Settings, out: &mut dyn Write) -> anyhow::Result<Outcome> {
    let store = ChannelStore::load(&settings.channels_path)?;

    let all_tags = store.all_tags();
    if all_tags.is_empty() {
        writeln!(out, "No tags configured.")?;
    }
    for tag in all_tags {
        writeln!(out, "{tag}")?;
    }

    Ok(Outcome::Success)
}
