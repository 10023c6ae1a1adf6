use std::io::Write;

use super::Outcome;
use crate::{config::Settings, store::ChannelStore};

pub fn run(settings: &Settings, out: &mut dyn Write, target: &str) -> anyhow::Result<Outcome> {
    let mut store = ChannelStore::load(&settings.channels_path)?;

    let Some(channel_id) = store.find(target).map(|channel| channel.channel_id.clone()) else {
        return super::no_match(out);
    };

    let removed = store.remove_id(&channel_id);
    tracing::info!(%channel_id, removed, "Removing channel");
    store.save()?;
    writeln!(out, "Removed.")?;

    Ok(Outcome::Success)
}
