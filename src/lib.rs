//! # Disc Arbiter
//!
//! Automated matches of an 8x8 disc-flipping game between two independently running
//! programs, plus a reference player for them to play against.
//!
//! It provides:
//! - The rules, shared by the arbiter and the reference player ([`rules`])
//! - Strict one-line-per-read framing of the wire protocol ([`transport`])
//! - Players running as child processes behind private pipes ([`client_handler`])
//! - Refereeing of a single match, forfeits included ([`match_runner`])
//! - Series of matches with colors swapped and aggregated statistics ([`tournament`])
//! - A fixed-depth negamax player ([`player`])
//!
//! Each match consists of two players, each running as a separate OS process started
//! through `/bin/sh -c`. Time spent by each side is measured, never limited.
//!
//! # Wire protocol
//!
//! One message per line over the player's standard input/output:
//!
//! - Arbiter -> first mover: `Start`, once, before anything else
//! - Arbiter -> player: the opponent's last move, e.g. `C5`
//! - Player -> arbiter: its move, a row `A`..`H` and a column `1`..`8`
//! - Arbiter -> player: `Quit` at the end of the match
//!
//! A player must write each line with a single write: the arbiter expects every read to
//! return exactly one line. A malformed or illegal move, a framing error, or end of file
//! forfeits the match, scored -99 when the first mover fails and +99 when the second does.
//!
//! # Usage Example
//!
//! ```no_run
//! use disc_arbiter::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Configuration::new().with_rounds(5);
//!     let tournament = Tournament::new(["./player".to_owned(), "./player --depth 1".to_owned()], config);
//!     let summary = tournament.run(&ShellLauncher, |game, result| {
//!         println!("{}", report_line(game, result));
//!     })?;
//!     print!("{summary}");
//!     Ok(())
//! }
//! ```

pub use anyhow;

mod agent;
pub mod client_handler;
pub mod configuration;
pub mod logger;
pub mod match_runner;
pub mod player;
pub mod rules;
#[cfg(test)]
mod testing;
pub mod tournament;
pub mod transport;

pub use agent::Agent;

/// Commonly used types and traits for quick access.
///
/// ```rust
/// use disc_arbiter::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client_handler::{ClientHandler, Launcher, LogSink, ShellLauncher};
    pub use crate::configuration::{Configuration, LogPolicy};
    pub use crate::match_runner::{run_match, MatchOutcome, MatchResult, FORFEIT_SCORE};
    pub use crate::rules::{Board, Move, Side};
    pub use crate::tournament::{report_line, Tournament, TournamentSummary};
    pub use crate::transport::PlayerLink;
}
