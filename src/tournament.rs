//! Repeated matches between the two configured players, with colors swapped every match.
//!
//! Matches run one after the other. A match lost by forfeit is just a result; only failing to
//! start a player stops the tournament.

use std::fmt;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, instrument};

use crate::agent::Agent;
use crate::client_handler::Launcher;
use crate::configuration::Configuration;
use crate::match_runner::{run_match, MatchResult};
use crate::rules::Side;

/// Who plays which color in one match, as indices into the configured agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub game: usize,
    pub first: usize,
    pub second: usize,
}

/// `num_games` matches; the first configured agent moves first in even matches.
pub fn schedule(num_games: usize) -> impl Iterator<Item = Pairing> {
    (0..num_games).map(|game| {
        let first = game & 1;
        Pairing {
            game,
            first,
            second: 1 - first,
        }
    })
}

/// `<index>: <transcript> <score>`, the score signed only when positive.
pub fn report_line(game: usize, result: &MatchResult) -> String {
    format!("{game:4}: {result}")
}

/// Aggregated results of one configured agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerStats {
    pub total_time: Duration,
    pub max_time: Duration,
    pub wins: u32,
    pub ties: u32,
    pub losses: u32,
    /// Matches lost by forfeit.
    pub failures: u32,
    /// Points scored as white and as black, from this agent's point of view.
    pub score_by_color: [i32; 2],
    pub score: i32,
}

impl PlayerStats {
    /// Accounts for one match played as `side`.
    pub fn record(&mut self, side: Side, result: &MatchResult) {
        let score = match side {
            Side::White => result.score,
            Side::Black => -result.score,
        };
        let time = result.think_time[side.index()];
        self.total_time += time;
        self.max_time = self.max_time.max(time);
        match score.signum() {
            1 => self.wins += 1,
            0 => self.ties += 1,
            _ => self.losses += 1,
        }
        if result.forfeited() == Some(side) {
            self.failures += 1;
        }
        self.score_by_color[side.index()] += score;
        self.score += score;
    }
}

#[derive(Debug, Clone)]
pub struct TournamentSummary {
    pub games: usize,
    pub agents: [Agent; 2],
    pub stats: [PlayerStats; 2],
}

impl fmt::Display for TournamentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Player               AvgTm MaxTm Wins Ties Loss Fail WhitPt BlckPt  Total"
        )?;
        writeln!(
            f,
            "-------------------- ----- ----- ---- ---- ---- ---- ------ ------ ------"
        )?;
        for (agent, stats) in self.agents.iter().zip(&self.stats) {
            writeln!(
                f,
                "{:<20} {:.3} {:.3} {:4} {:4} {:4} {:4} {:+6} {:+6} {:+6}",
                agent.display_name(),
                stats.total_time.as_secs_f64() / self.games.max(1) as f64,
                stats.max_time.as_secs_f64(),
                stats.wins,
                stats.ties,
                stats.losses,
                stats.failures,
                stats.score_by_color[0],
                stats.score_by_color[1],
                stats.score,
            )?;
        }
        Ok(())
    }
}

pub struct Tournament {
    agents: [Agent; 2],
    config: Configuration,
}

impl Tournament {
    pub fn new(commands: [String; 2], config: Configuration) -> Self {
        let [first, second] = commands;
        Tournament {
            agents: [Agent::new(0, first), Agent::new(1, second)],
            config,
        }
    }

    /// Plays every scheduled match, calling `on_result` after each one.
    ///
    /// # Errors
    /// Returned when a player cannot be started; no further match is played.
    #[instrument(skip_all)]
    pub fn run<L, F>(&self, launcher: &L, mut on_result: F) -> anyhow::Result<TournamentSummary>
    where
        L: Launcher,
        F: FnMut(usize, &MatchResult),
    {
        let games = self.config.num_games();
        let mut stats: [PlayerStats; 2] = Default::default();

        for Pairing {
            game,
            first,
            second,
        } in schedule(games)
        {
            let white = &self.agents[first];
            let black = &self.agents[second];
            info!(game, white = %white.command, black = %black.command, "starting match");

            let white_link = launcher
                .launch(
                    &white.command,
                    &white.log_sink(&self.config.logs, game, Side::White),
                )
                .with_context(|| format!("could not start {} ('{}')", white.name, white.command))?;
            let black_link = launcher
                .launch(
                    &black.command,
                    &black.log_sink(&self.config.logs, game, Side::Black),
                )
                .with_context(|| format!("could not start {} ('{}')", black.name, black.command))?;

            let result = run_match(white_link, black_link);
            stats[first].record(Side::White, &result);
            stats[second].record(Side::Black, &result);
            on_result(game, &result);
        }

        Ok(TournamentSummary {
            games,
            agents: self.agents.clone(),
            stats,
        })
    }
}
