//! The reference player: speaks the wire protocol on its standard input/output and picks
//! moves with [`search::Searcher`].
//!
//! The player is never told which side it plays. `Start` as first message means it moves
//! first; a move as first message means the opponent did.

use std::io::{self, BufRead, Write};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::rules::{Board, Move, ParseMoveError, Side};
use crate::transport::escape;

pub mod search;

use search::Searcher;

/// How a game ended for the player, when it ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerExit {
    /// `Quit` received.
    Quit,
    /// Our turn, but nothing is playable.
    NoMoves,
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("premature end of input")]
    PrematureEof,
    #[error("invalid move received {}: {source}", escape(.line.as_bytes()))]
    InvalidMove {
        line: String,
        #[source]
        source: ParseMoveError,
    },
    #[error("illegal move received: {0}")]
    IllegalMove(Move),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What reading one line from the arbiter amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    Start,
    Move(Move),
    Quit,
}

pub struct SearchPlayer<R> {
    board: Board,
    side: Option<Side>,
    searcher: Searcher<R>,
}

impl<R: Rng> SearchPlayer<R> {
    pub fn new(searcher: Searcher<R>) -> Self {
        SearchPlayer {
            board: Board::initial(),
            side: None,
            searcher,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// `None` until the first message arrived.
    pub fn side(&self) -> Option<Side> {
        self.side
    }

    pub fn is_my_turn(&self) -> bool {
        self.side == Some(self.board.next_side())
    }

    /// Chooses and plays our move, or `None` if there is none.
    pub fn play_own_move(&mut self) -> Option<Move> {
        let (mv, value) = self.searcher.select_move(&self.board)?;
        debug!(%mv, value, ply = self.board.moves_played(), "move selected");
        self.board.apply(mv);
        Some(mv)
    }

    /// Handles one line from the arbiter (newline already stripped).
    pub fn receive(&mut self, line: &str) -> Result<Received, PlayerError> {
        if line == "Quit" {
            return Ok(Received::Quit);
        }
        if self.side.is_none() {
            if line == "Start" {
                self.side = Some(Side::White);
                return Ok(Received::Start);
            }
            self.side = Some(Side::Black);
        }
        let mv: Move = line.parse().map_err(|source| PlayerError::InvalidMove {
            line: line.to_owned(),
            source,
        })?;
        // same check as the arbiter's
        if !self.board.is_legal(mv) {
            return Err(PlayerError::IllegalMove(mv));
        }
        self.board.apply(mv);
        Ok(Received::Move(mv))
    }

    /// Main loop: alternate between answering with a move and waiting for the opponent's.
    pub fn play<I: BufRead, O: Write>(
        &mut self,
        mut input: I,
        mut output: O,
    ) -> Result<PlayerExit, PlayerError> {
        loop {
            if self.is_my_turn() {
                let Some(mv) = self.play_own_move() else {
                    info!("no move possible, exiting");
                    return Ok(PlayerExit::NoMoves);
                };
                // one write per line: the arbiter rejects split lines
                output.write_all(format!("{mv}\n").as_bytes())?;
                output.flush()?;
                continue;
            }

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(PlayerError::PrematureEof);
            }
            let line = line.strip_suffix('\n').unwrap_or(&line);
            if self.receive(line)? == Received::Quit {
                info!("quit received, exiting");
                return Ok(PlayerExit::Quit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::match_runner::{run_match, MatchOutcome};
    use crate::rules::{replay, MAX_MOVES};
    use crate::transport::{PlayerLink, TransportError};

    fn player(seed: u64, depth: u32) -> SearchPlayer<StdRng> {
        SearchPlayer::new(Searcher::new(StdRng::seed_from_u64(seed), depth))
    }

    fn run(input: &str) -> (Result<PlayerExit, PlayerError>, String) {
        let mut output = vec![];
        let result = player(5, 1).play(Cursor::new(input.to_owned()), &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn start_makes_it_the_first_mover() {
        let (result, output) = run("Start\nQuit\n");
        assert_eq!(result.unwrap(), PlayerExit::Quit);
        let mv: Move = output.trim_end().parse().unwrap();
        assert!(Board::initial().is_legal(mv));
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn a_move_first_makes_it_the_second_mover() {
        let mut p = player(5, 1);
        assert_eq!(p.receive("C5").unwrap(), Received::Move("C5".parse().unwrap()));
        assert_eq!(p.side(), Some(Side::Black));
        assert!(p.is_my_turn());
        let mv = p.play_own_move().unwrap();
        assert_eq!(replay(&format!("C5{mv}")).unwrap(), *p.board());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            run("ZZ\n").0,
            Err(PlayerError::InvalidMove { .. })
        ));
        assert!(matches!(run("A1\n").0, Err(PlayerError::IllegalMove(_))));
        assert!(matches!(run("").0, Err(PlayerError::PrematureEof)));
        assert!(matches!(
            run("Start\nStart\n").0,
            Err(PlayerError::InvalidMove { .. })
        ));
    }

    /// Drives a [`SearchPlayer`] in-process, as if it were behind a pipe.
    struct LocalPlayer {
        player: SearchPlayer<StdRng>,
        outbox: VecDeque<Vec<u8>>,
    }

    impl PlayerLink for LocalPlayer {
        fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
            self.player.receive(line).expect("arbiter sent a bad line");
            Ok(())
        }

        fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
            if self.outbox.is_empty() && self.player.is_my_turn() {
                if let Some(mv) = self.player.play_own_move() {
                    self.outbox.push_back(mv.to_string().into_bytes());
                }
            }
            self.outbox.pop_front().ok_or(TransportError::Eof)
        }

        fn quit(&mut self) {}
    }

    #[test]
    fn two_search_players_finish_a_match() {
        let local = |seed| LocalPlayer {
            player: player(seed, 1),
            outbox: VecDeque::new(),
        };
        let result = run_match(local(1), local(2));
        assert!(matches!(result.outcome, MatchOutcome::Completed));
        assert_eq!(result.transcript.len(), MAX_MOVES);
        assert_eq!(
            replay(&result.encoded_transcript()).unwrap().score(),
            result.score
        );
    }
}
