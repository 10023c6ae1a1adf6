mod commands;
mod config;
mod feed;
mod log;
mod resolve;
mod store;
mod types;
mod utils;
mod ytdlp;

use std::{io, path::PathBuf, process::ExitCode};

use clap::{ArgAction, Parser, Subcommand};
use time::{OffsetDateTime, UtcOffset};

/// Track a fixed list of YouTube channels and report new videos.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to channels json file [default: ~/.config/yt-channel-watch/channels.json]
    #[arg(long, global = true, env = "YT_CHANNEL_WATCH_CONFIG")]
    config: Option<PathBuf>,

    /// yt-dlp executable used for channel and duration lookups
    #[arg(long = "yt-dlp", global = true, env = "YT_DLP", default_value = "yt-dlp")]
    yt_dlp: PathBuf,

    /// Timeout in seconds for each feed request
    #[arg(
        long,
        global = true,
        env = "YT_CHANNEL_WATCH_FEED_TIMEOUT",
        default_value_t = config::DEFAULT_FEED_TIMEOUT_SECS,
        value_parser = config::parse_feed_timeout
    )]
    feed_timeout: u64,

    /// More logging, can be repeated
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a channel
    Add {
        /// YouTube channel URL, @handle, or channel id
        channel: String,
        /// Optional display name override
        #[arg(long)]
        name: Option<String>,
        /// Optional explicit channel id (UC...) to skip lookup
        #[arg(long)]
        channel_id: Option<String>,
    },
    /// Remove a channel
    Remove {
        /// Channel id, source URL/handle, or channel name
        channel: String,
    },
    /// Show configured channels and tags
    Channels,
    /// Add tag(s) to a channel
    TagAdd {
        /// Channel id, source URL/handle, or channel name
        channel: String,
        /// Tag values to add
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Remove tag(s) from a channel
    TagRemove {
        /// Channel id, source URL/handle, or channel name
        channel: String,
        /// Tag values to remove
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// List all tags currently in use
    Tags,
    /// List recent videos
    List {
        /// How many hours back to check
        #[arg(long, default_value = "24", value_parser = commands::list::parse_hours)]
        hours: f64,
        /// Only include channels with at least one tag matching this regex
        #[arg(long)]
        tag_regex: Option<String>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    // Has to happen before any other threads get spawned, otherwise the lookup refuses to run on
    // unix. Only used when the per-video lookup later on fails
    let startup_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let local_offset =
        move |at: OffsetDateTime| UtcOffset::local_offset_at(at).unwrap_or(startup_offset);

    // A missing `.env` is the common case
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    log::init(cli.verbose)?;
    tracing::debug!(?cli, "Parsed args");

    let settings = config::Settings::new(cli.config.as_deref(), cli.yt_dlp, cli.feed_timeout)?;
    let yt_dlp = ytdlp::YtDlp::new(settings.yt_dlp.clone());
    let (mut stdout, mut stderr) = (io::stdout(), io::stderr());

    let outcome = match cli.command {
        Command::Add {
            channel,
            name,
            channel_id,
        } => commands::add::run(
            &settings,
            &yt_dlp,
            &mut stdout,
            &channel,
            name.as_deref(),
            channel_id.as_deref(),
        ),
        Command::Remove { channel } => commands::remove::run(&settings, &mut stdout, &channel),
        Command::Channels => commands::channels::run(&settings, &mut stdout),
        Command::TagAdd { channel, tags } => {
            commands::tags::add(&settings, &mut stdout, &channel, &tags)
        }
        Command::TagRemove { channel, tags } => {
            commands::tags::remove(&settings, &mut stdout, &channel, &tags)
        }
        Command::Tags => commands::tags::list(&settings, &mut stdout),
        Command::List { hours, tag_regex } => {
            let feed = feed::YoutubeFeed::new(settings.feed_timeout)?;
            commands::list::run(
                &settings,
                Box::new(feed),
                &yt_dlp,
                &local_offset,
                &mut stdout,
                &mut stderr,
                commands::list::ListArgs {
                    hours,
                    tag_regex: tag_regex.as_deref(),
                },
            )
        }
    }?;

    Ok(outcome.into())
}
