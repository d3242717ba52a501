//! Patrol console
//!
//! Reads patrol commands from stdin, one per line, and prints the engine's
//! reply. Parse errors are printed and the console keeps reading; only
//! `quit` or end of input ends the session.
//!
//! Replies go to stderr while the dashboard owns stdout.

use std::io::Write;
use std::str::FromStr;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_graceful_shutdown::SubsystemHandle;

use blueshield_core::alerts::QUICK_MESSAGES;
use blueshield_core::{Priority, SafetyStatus};

use crate::{EngineHandle, ServerError};

pub const HELP: &str = "\
Commands:
  send <ais> <low|medium|high> <text...>   send a message to a vessel
  status <ais> <safe|warning|danger>       override a vessel's status
  quick <1-5> <ais>                        send a canned message
  track on|off                             start or stop periodic analysis
  fleet                                    list all vessels
  alerts [ais]                             list alerts, optionally for one vessel
  help                                     this text
  quit                                     end the session";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Send {
        ais_id: String,
        priority: Priority,
        text: String,
    },
    Status {
        ais_id: String,
        status: SafetyStatus,
    },
    /// Canned message, index into [`QUICK_MESSAGES`]
    Quick { index: usize, ais_id: String },
    Track(bool),
    Fleet,
    Alerts(Option<String>),
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum ConsoleError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    InvalidArgument(String),
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(ConsoleError::Empty);
        };

        match verb.to_ascii_lowercase().as_str() {
            "send" => {
                const USAGE: &str = "send <ais> <low|medium|high> <text...>";
                let ais_id = words.next().ok_or(ConsoleError::Usage(USAGE))?;
                let priority = words
                    .next()
                    .ok_or(ConsoleError::Usage(USAGE))?
                    .parse::<Priority>()
                    .map_err(ConsoleError::InvalidArgument)?;
                let text = words.collect::<Vec<_>>().join(" ");
                if text.is_empty() {
                    return Err(ConsoleError::Usage(USAGE));
                }
                Ok(ConsoleCommand::Send {
                    ais_id: ais_id.to_string(),
                    priority,
                    text,
                })
            }
            "status" => {
                const USAGE: &str = "status <ais> <safe|warning|danger>";
                let ais_id = words.next().ok_or(ConsoleError::Usage(USAGE))?;
                let status = words
                    .next()
                    .ok_or(ConsoleError::Usage(USAGE))?
                    .parse::<SafetyStatus>()
                    .map_err(ConsoleError::InvalidArgument)?;
                Ok(ConsoleCommand::Status {
                    ais_id: ais_id.to_string(),
                    status,
                })
            }
            "quick" => {
                const USAGE: &str = "quick <1-5> <ais>";
                let number: usize = words
                    .next()
                    .ok_or(ConsoleError::Usage(USAGE))?
                    .parse()
                    .map_err(|_| ConsoleError::Usage(USAGE))?;
                if number == 0 || number > QUICK_MESSAGES.len() {
                    return Err(ConsoleError::InvalidArgument(format!(
                        "quick message {} does not exist, choose 1-{}",
                        number,
                        QUICK_MESSAGES.len()
                    )));
                }
                let ais_id = words.next().ok_or(ConsoleError::Usage(USAGE))?;
                Ok(ConsoleCommand::Quick {
                    index: number - 1,
                    ais_id: ais_id.to_string(),
                })
            }
            "track" => match words.next().map(str::to_ascii_lowercase).as_deref() {
                Some("on") => Ok(ConsoleCommand::Track(true)),
                Some("off") => Ok(ConsoleCommand::Track(false)),
                _ => Err(ConsoleError::Usage("track on|off")),
            },
            "fleet" => Ok(ConsoleCommand::Fleet),
            "alerts" => Ok(ConsoleCommand::Alerts(words.next().map(str::to_string))),
            "help" | "?" => Ok(ConsoleCommand::Help),
            "quit" | "exit" => Ok(ConsoleCommand::Quit),
            other => Err(ConsoleError::Unknown(other.to_string())),
        }
    }
}

/// Stream the console prints its replies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutput {
    Stdout,
    Stderr,
}

impl ReplyOutput {
    /// Keep stdout free for the dashboard's JSON lines
    pub fn with_dashboard(dashboard: bool) -> Self {
        if dashboard {
            ReplyOutput::Stderr
        } else {
            ReplyOutput::Stdout
        }
    }

    fn print(self, text: &str) -> std::io::Result<()> {
        match self {
            ReplyOutput::Stdout => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{}", text)?;
                out.flush()
            }
            ReplyOutput::Stderr => {
                let mut out = std::io::stderr().lock();
                writeln!(out, "{}", text)
            }
        }
    }
}

pub struct Console {
    engine: EngineHandle,
    output: ReplyOutput,
}

impl Console {
    pub fn new(engine: EngineHandle, output: ReplyOutput) -> Self {
        Console { engine, output }
    }

    pub async fn run(self, subsys: SubsystemHandle) -> Result<(), ServerError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        log::debug!("console: reading commands from stdin");

        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::debug!("console: shutdown");
                    return Ok(());
                },

                r = lines.next_line() => {
                    match r? {
                        None => {
                            log::info!("console: end of input");
                            return Ok(());
                        }
                        Some(line) => {
                            if line.trim().is_empty() {
                                continue;
                            }
                            match line.parse::<ConsoleCommand>() {
                                Ok(ConsoleCommand::Help) => self.output.print(HELP)?,
                                Ok(ConsoleCommand::Quit) => {
                                    log::info!("console: quit requested");
                                    subsys.request_shutdown();
                                    return Ok(());
                                }
                                Ok(command) => {
                                    let reply = self.engine.console(command).await?;
                                    self.output.print(&reply)?;
                                }
                                Err(e) => self.output.print(&e.to_string())?,
                            }
                        }
                    }
                },
            }
        }
    }
}
