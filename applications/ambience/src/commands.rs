//! Interactive command loop
//!
//! Reads one command per line and forwards it to the session controller.

use crate::error::{AppError, Result};
use crate::renderer::format_entries;
use ambience_core::{EntryId, SettingsStore};
use ambience_session::SessionHandle;
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

pub const HELP: &str = "commands: list | play <id> | on | off | quit";

/// One line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    List,
    Play(EntryId),
    /// Resume the last played entry
    On,
    Off,
    Help,
    Quit,
}

impl FromStr for UserCommand {
    type Err = AppError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let command = match (words.next(), words.next()) {
            (Some("list" | "ls"), None) => UserCommand::List,
            (Some("play"), Some(id)) => id
                .parse::<u64>()
                .map(|id| UserCommand::Play(EntryId::new(id)))
                .map_err(|_| AppError::UnknownCommand(line.trim().to_string()))?,
            (Some("on"), None) => UserCommand::On,
            (Some("off" | "stop"), None) => UserCommand::Off,
            (Some("help" | "?"), None) => UserCommand::Help,
            (Some("quit" | "exit" | "q"), None) => UserCommand::Quit,
            _ => return Err(AppError::UnknownCommand(line.trim().to_string())),
        };

        if words.next().is_some() {
            return Err(AppError::UnknownCommand(line.trim().to_string()));
        }
        Ok(command)
    }
}

/// Run commands from `input` until `quit` or end of input
///
/// Each command is fully processed by the controller before the next line
/// is read, so `list` always reflects what came before it.
pub async fn run_interactive<I, S, W>(
    handle: &SessionHandle,
    settings: &S,
    input: I,
    out: &mut W,
) -> Result<()>
where
    I: AsyncBufRead + Unpin,
    S: SettingsStore + ?Sized,
    W: Write,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<UserCommand>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{e}")?;
                writeln!(out, "{HELP}")?;
                continue;
            }
        };
        debug!("User command: {:?}", command);

        match command {
            UserCommand::List => {
                for line in format_entries(&settings.entries()?, &handle.snapshot()) {
                    writeln!(out, "{line}")?;
                }
            }
            UserCommand::Play(id) => match settings.entry(id)? {
                Some(entry) => handle.activate(entry)?,
                None => writeln!(out, "no entry with id {id}")?,
            },
            UserCommand::On => handle.resume_last()?,
            UserCommand::Off => handle.deactivate()?,
            UserCommand::Help => writeln!(out, "{HELP}")?,
            UserCommand::Quit => break,
        }

        handle.flush().await?;
        out.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("list".parse::<UserCommand>().unwrap(), UserCommand::List);
        assert_eq!(
            "  play 7 ".parse::<UserCommand>().unwrap(),
            UserCommand::Play(EntryId::new(7))
        );
        assert_eq!("on".parse::<UserCommand>().unwrap(), UserCommand::On);
        assert_eq!("off".parse::<UserCommand>().unwrap(), UserCommand::Off);
        assert_eq!("q".parse::<UserCommand>().unwrap(), UserCommand::Quit);
    }

    #[test]
    fn rejects_malformed_commands() {
        for line in ["play", "play seven", "play 1 2", "list all", "dance"] {
            assert!(
                matches!(line.parse::<UserCommand>(), Err(AppError::UnknownCommand(_))),
                "accepted {line:?}"
            );
        }
    }
}
