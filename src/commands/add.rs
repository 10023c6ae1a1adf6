use std::io::Write;

use super::Outcome;
use crate::{
    config::Settings, resolve, store::ChannelStore, types::Channel, ytdlp::ChannelLookup,
};

pub fn run(
    settings: &Settings,
    lookup: &dyn ChannelLookup,
    out: &mut dyn Write,
    channel: &str,
    name: Option<&str>,
    channel_id: Option<&str>,
) -> anyhow::Result<Outcome> {
    let mut store = ChannelStore::load(&settings.channels_path)?;

    let resolved = resolve::resolve_channel(channel, channel_id, lookup)?;

    if let Some(existing) = store.get(&resolved.channel_id) {
        writeln!(out, "Channel already added: {existing}")?;
        return Ok(Outcome::Success);
    }

    let display_name = display_name(name, resolved.name);
    let channel = Channel::new(resolved.channel_id, display_name, resolved.source);
    tracing::info!(?channel, "Adding channel");
    let added = channel.to_string();
    store.push(channel);
    store.save()?;
    writeln!(out, "Added: {added}")?;

    Ok(Outcome::Success)
}

/// A blank `--name` falls back to the resolved name
fn display_name(name_override: Option<&str>, resolved: String) -> String {
    match name_override.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => resolved,
    }
}
