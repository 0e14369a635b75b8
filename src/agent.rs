use std::path::PathBuf;

use crate::client_handler::LogSink;
use crate::configuration::LogPolicy;
use crate::rules::Side;

/// One of the two configured players of a tournament.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Agent {
    /// `p1` or `p2`, used in log file names.
    pub name: String,
    /// Shell command starting the player.
    pub command: String,
}

impl Agent {
    pub fn new(index: usize, command: impl Into<String>) -> Agent {
        Agent {
            name: format!("p{}", index + 1),
            command: command.into(),
        }
    }

    /// The command, with leading path segments dropped while it is longer than 20 characters.
    pub fn display_name(&self) -> &str {
        let mut name = self.command.as_str();
        while name.len() > 20 {
            match name.split_once('/') {
                Some((_, rest)) => name = rest,
                None => break,
            }
        }
        name
    }

    /// Where this agent's standard error goes when it plays `side` in match `game`.
    pub fn log_sink(&self, policy: &LogPolicy, game: usize, side: Side) -> LogSink {
        match policy {
            LogPolicy::Discard => LogSink::Discard,
            LogPolicy::Forward => LogSink::Forward,
            LogPolicy::Files(prefix) => LogSink::File(PathBuf::from(format!(
                "{prefix}{game:04}_{}_{side}",
                self.name
            ))),
        }
    }
}
