use std::{
    io,
    path::PathBuf,
    process::{Command, Output},
};

pub const UNKNOWN_DURATION: &str = "unknown";

/// A channel as reported by yt-dlp. Nothing here is validated yet
#[derive(Debug, PartialEq, Eq)]
pub struct LookedUpChannel {
    pub id: String,
    pub name: String,
}

/// The outside world's knowledge about channels and videos
pub trait ChannelLookup {
    fn lookup_channel(&self, url: &str) -> anyhow::Result<LookedUpChannel>;
    fn video_duration(&self, url: &str) -> String;
}

pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Runs yt-dlp with `args`. `Ok(None)` means the program isn't installed
    fn run(&self, args: &[&str]) -> io::Result<Option<Output>> {
        tracing::debug!(program = %self.program.display(), ?args, "Running yt-dlp");
        match Command::new(&self.program).args(args).output() {
            Ok(output) => Ok(Some(output)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl ChannelLookup for YtDlp {
    fn lookup_channel(&self, url: &str) -> anyhow::Result<LookedUpChannel> {
        let args = [
            "--skip-download",
            "--playlist-items",
            "1",
            "--print",
            "channel_id",
            "--print",
            "uploader",
            url,
        ];
        let Some(output) = self.run(&args)? else {
            anyhow::bail!(
                "yt-dlp is required to resolve handles/URLs. Install it first (e.g. `brew install yt-dlp`)."
            );
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = match stderr.trim() {
                "" => "unknown error",
                trimmed => trimmed,
            };
            anyhow::bail!("Failed to resolve channel: {stderr}");
        }

        parse_channel_output(&String::from_utf8_lossy(&output.stdout))
    }

    fn video_duration(&self, url: &str) -> String {
        let output = match self.run(&["--skip-download", "--print", "duration_string", url]) {
            Ok(Some(output)) if output.status.success() => output,
            Ok(Some(output)) => {
                tracing::debug!(url, status = %output.status, "yt-dlp couldn't get duration");
                return UNKNOWN_DURATION.to_owned();
            }
            Ok(None) => return UNKNOWN_DURATION.to_owned(),
            Err(err) => {
                tracing::warn!(%err, "Failed running yt-dlp");
                return UNKNOWN_DURATION.to_owned();
            }
        };

        first_line(&String::from_utf8_lossy(&output.stdout))
            .unwrap_or(UNKNOWN_DURATION)
            .to_owned()
    }
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

fn first_line(text: &str) -> Option<&str> {
    non_empty_lines(text).next()
}

fn parse_channel_output(stdout: &str) -> anyhow::Result<LookedUpChannel> {
    let mut lines = non_empty_lines(stdout);
    match (lines.next(), lines.next()) {
        (Some(id), Some(name)) => Ok(LookedUpChannel {
            id: id.to_owned(),
            name: name.to_owned(),
        }),
        _ => anyhow::bail!("Could not resolve channel id/name from yt-dlp output."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_output() {
        let parsed = parse_channel_output("\nUCabcdefghijklmnopqrstuv\n  Some Uploader  \nextra\n")
            .unwrap();
        assert_eq!(
            parsed,
            LookedUpChannel {
                id: "UCabcdefghijklmnopqrstuv".to_owned(),
                name: "Some Uploader".to_owned(),
            }
        );

        let err = parse_channel_output("UCabcdefghijklmnopqrstuv\n\n").unwrap_err();
        insta::assert_snapshot!(err, @"Could not resolve channel id/name from yt-dlp output.");
    }

    #[test]
    fn duration_line() {
        assert_eq!(first_line("\n  12:34\n"), Some("12:34"));
        assert_eq!(first_line("  \n"), None);
    }

    #[test]
    fn missing_program() {
        let yt_dlp = YtDlp::new(PathBuf::from("definitely-not-a-real-yt-dlp-binary"));

        assert_eq!(yt_dlp.video_duration("https://youtu.be/x"), UNKNOWN_DURATION);
        let err = yt_dlp.lookup_channel("https://youtu.be/x").unwrap_err();
        assert!(err.to_string().starts_with("yt-dlp is required"));
    }
}
