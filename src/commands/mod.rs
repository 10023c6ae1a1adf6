pub mod add;
pub mod channels;
pub mod list;
pub mod remove;
pub mod tags;

use std::{io::Write, process::ExitCode};

/// How a command finished. Errors proper go through `anyhow` instead
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Nothing matched, or there was nothing to work with
    Failure,
    InvalidPattern,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::FAILURE,
            Outcome::InvalidPattern => ExitCode::from(2),
        }
    }
}

/// Shared by every command that has to look a channel up first
fn no_match(out: &mut dyn Write) -> anyhow::Result<Outcome> {
    writeln!(out, "No matching channel found.")?;
    Ok(Outcome::Failure)
}
