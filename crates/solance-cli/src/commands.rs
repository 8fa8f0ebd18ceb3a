//! Slash commands for the interactive loop.

use std::future::Future;
use std::str::FromStr;

use solance_core::models::mode::Mode;
use tokio::io::{AsyncBufRead, Lines};

pub const HELP: &str = "\
Type a message and press Enter to send it.

  /new [mode]      start a conversation (student, coder, chill, solance)
  /list            list conversations, newest first
  /switch <n>      make conversation n active
  /delete <n>      delete conversation n
  /mode <mode>     change the mode for the next messages
  /rename <title>  rename the active conversation
  /usage           show today's message quota
  /config          show the loaded configuration (keys redacted)
  /help            show this help
  /quit            exit (Ctrl-D also works)

Ctrl-C cancels a reply that is still pending; at the prompt it exits.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Anything that is not a slash command, sent as typed.
    Message(String),
    New(Option<Mode>),
    List,
    /// 1-based position in the list.
    Switch(usize),
    /// 1-based position in the list.
    Delete(usize),
    Mode(Mode),
    Rename(String),
    Usage,
    Config,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = eyre::Report;

    fn from_str(line: &str) -> eyre::Result<Self> {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Ok(Command::Message(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "new" if arg.is_empty() => Command::New(None),
            "new" => Command::New(Some(arg.parse()?)),
            "list" | "ls" => Command::List,
            "switch" => Command::Switch(position(arg)?),
            "delete" | "rm" => Command::Delete(position(arg)?),
            "mode" if arg.is_empty() => return Err(eyre::eyre!("usage: /mode <mode>")),
            "mode" => Command::Mode(arg.parse()?),
            "rename" if arg.is_empty() => return Err(eyre::eyre!("usage: /rename <title>")),
            "rename" => Command::Rename(arg.to_string()),
            "usage" => Command::Usage,
            "config" => Command::Config,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(eyre::eyre!("unknown command /{other}; try /help")),
        };
        Ok(command)
    }
}

fn position(arg: &str) -> eyre::Result<usize> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(eyre::eyre!("expected a conversation number from /list, got {arg:?}")),
    }
}

/// What the prompt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// End of input (Ctrl-D).
    Eof,
    /// `interrupt` fired while waiting for a line.
    Interrupted,
}

/// Wait for the next line, or for `interrupt` to resolve first.
pub async fn next_input<R, F>(lines: &mut Lines<R>, interrupt: F) -> std::io::Result<Input>
where
    R: AsyncBufRead + Unpin,
    F: Future,
{
    tokio::select! {
        line = lines.next_line() => Ok(match line? {
            Some(line) => Input::Line(line),
            None => Input::Eof,
        }),
        _ = interrupt => Ok(Input::Interrupted),
    }
}
