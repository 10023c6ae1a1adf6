use std::io::Write;

use super::Outcome;
use crate::{config::Settings, store::ChannelStore, types::Channel};

pub fn run(settings: &Settings, out: &mut dyn Write) -> anyhow::Result<Outcome> {
    let store = ChannelStore::load(&settings.channels_path)?;
    if store.is_empty() {
        writeln!(out, "No channels configured.")?;
        return Ok(Outcome::Success);
    }

    for channel in store.channels() {
        writeln!(out, "{}", format_line(channel))?;
    }

    Ok(Outcome::Success)
}

fn format_line(channel: &Channel) -> String {
    format!(
        "- {channel} [{}] tags: {}",
        channel.source,
        channel.format_tags()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        commands::test_support::{text, Sandbox},
        types::ChannelId,
    };

    #[test]
    fn line() {
        let mut channel = Channel::new(
            ChannelId::parse("UCabcdefghijklmnopqrstuv").unwrap(),
            "Some Channel".to_owned(),
            "@some".to_owned(),
        );
        insta::assert_snapshot!(
            format_line(&channel),
            @"- Some Channel (UCabcdefghijklmnopqrstuv) [@some] tags: -"
        );

        channel.tags.insert("tech".into());
        channel.tags.insert("music".into());
        insta::assert_snapshot!(
            format_line(&channel),
            @"- Some Channel (UCabcdefghijklmnopqrstuv) [@some] tags: music, tech"
        );
    }

    #[test]
    fn empty_store() {
        let sandbox = Sandbox::new();
        let mut out = Vec::new();

        assert_eq!(run(&sandbox.settings, &mut out).unwrap(), Outcome::Success);
        assert_eq!(text(out), "No channels configured.\n");
    }

    #[test]
    fn one_line_per_channel() {
        let sandbox = Sandbox::seeded();
        let mut out = Vec::new();

        run(&sandbox.settings, &mut out).unwrap();
        let out = text(out);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("- Alpha ("));
        assert!(lines[1].ends_with("[@beta] tags: music"));
    }
}
