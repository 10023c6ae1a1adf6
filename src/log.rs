use std::io;

use tracing_log::LogTracer;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Logs go to stderr so they never mix with command output. `LOG` takes the usual env-filter
/// directives, otherwise each `-v` bumps the default level past `warn`
pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let default_level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .compact()
        .without_time()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .with_env_var("LOG")
                .from_env()?,
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    LogTracer::init()?;

    Ok(())
}
