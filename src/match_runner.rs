use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, instrument, trace};

use crate::rules::{encode_transcript, Board, Move, ParseMoveError, Side};
use crate::transport::{escape, Message, PlayerLink, TransportError};

/// Magnitude of the score given to the winner when the other side forfeits.
pub const FORFEIT_SCORE: i32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    NotStarted,
    InProgress,
    Completed,
    AbortedProtocolError,
    AbortedIllegalMove,
}

impl MatchState {
    pub fn is_finished(self) -> bool {
        !matches!(self, MatchState::NotStarted | MatchState::InProgress)
    }
}

/// Why a side lost by forfeit.
#[derive(Debug, Error)]
pub enum ForfeitReason {
    #[error("could not send '{line}': {source}")]
    Send {
        line: String,
        #[source]
        source: TransportError,
    },
    #[error("could not read a move: {0}")]
    Receive(#[source] TransportError),
    #[error("could not parse move {}: {source}", escape(.line))]
    Malformed {
        line: Vec<u8>,
        #[source]
        source: ParseMoveError,
    },
    #[error("invalid move {mv} (valid moves: {})", list_moves(.legal))]
    IllegalMove { mv: Move, legal: Vec<Move> },
}

fn list_moves(moves: &[Move]) -> String {
    moves
        .iter()
        .map(Move::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug)]
pub enum MatchOutcome {
    /// All plies were played.
    Completed,
    Forfeit { side: Side, reason: ForfeitReason },
}

/// What one match produced.
#[derive(Debug)]
pub struct MatchResult {
    pub transcript: Vec<Move>,
    /// Disc differential from the first mover's point of view, or ±[`FORFEIT_SCORE`].
    pub score: i32,
    /// Wall-clock time each side spent between receiving its cue and answering,
    /// indexed by [`Side::index`].
    pub think_time: [Duration; 2],
    pub outcome: MatchOutcome,
}

impl MatchResult {
    pub fn encoded_transcript(&self) -> String {
        encode_transcript(&self.transcript)
    }

    /// The side that forfeited, if any.
    pub fn forfeited(&self) -> Option<Side> {
        match self.outcome {
            MatchOutcome::Completed => None,
            MatchOutcome::Forfeit { side, .. } => Some(side),
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.score > 0 { "+" } else { "" };
        write!(f, "{} {sign}{}", self.encoded_transcript(), self.score)
    }
}

/// Referees one match between two already running players.
///
/// The players are indexed by side: `players[0]` moves first. Only one read is ever
/// outstanding, and both players are shut down when the match ends, however it ends.
pub struct MatchController<L: PlayerLink> {
    players: [L; 2],
    board: Board,
    transcript: Vec<Move>,
    think_time: [Duration; 2],
    clock: Instant,
    state: MatchState,
    forfeit: Option<(Side, ForfeitReason)>,
}

impl<L: PlayerLink> MatchController<L> {
    pub fn new(first: L, second: L) -> Self {
        MatchController {
            players: [first, second],
            board: Board::initial(),
            transcript: Vec::new(),
            think_time: [Duration::ZERO; 2],
            clock: Instant::now(),
            state: MatchState::NotStarted,
            forfeit: None,
        }
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Advances the state machine by one transition and returns the new state.
    pub fn step(&mut self) -> MatchState {
        match self.state {
            MatchState::NotStarted => self.start(),
            MatchState::InProgress if self.board.is_over() => {
                self.state = MatchState::Completed;
            }
            MatchState::InProgress => self.play_ply(),
            _ => {}
        }
        self.state
    }

    /// Plays until the match is decided, then shuts both players down.
    #[instrument(skip_all)]
    pub fn run(mut self) -> MatchResult {
        while !self.state.is_finished() {
            self.step();
        }
        self.finish()
    }

    fn start(&mut self) {
        self.clock = Instant::now();
        self.state = MatchState::InProgress;
        if let Err(source) = self.players[0].write_line(&Message::Start.encode()) {
            self.abort(
                MatchState::AbortedProtocolError,
                ForfeitReason::Send {
                    line: Message::Start.encode(),
                    source,
                },
            );
        }
    }

    fn play_ply(&mut self) {
        let side = self.board.next_side();
        let line = self.players[side.index()].read_line();
        self.think_time[side.index()] += self.clock.elapsed();

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                return self.abort(MatchState::AbortedProtocolError, ForfeitReason::Receive(e))
            }
        };
        let mv = match Move::parse(&line) {
            Ok(mv) => mv,
            Err(source) => {
                return self.abort(
                    MatchState::AbortedProtocolError,
                    ForfeitReason::Malformed { line, source },
                )
            }
        };
        let legal = self.board.legal_moves();
        if !legal.contains(&mv) {
            return self.abort(
                MatchState::AbortedIllegalMove,
                ForfeitReason::IllegalMove { mv, legal },
            );
        }

        self.board.apply(mv);
        self.transcript.push(mv);
        trace!(%side, %mv, ply = self.transcript.len(), "move played");

        if self.board.is_over() {
            self.state = MatchState::Completed;
            return;
        }
        let line = mv.to_string();
        self.clock = Instant::now();
        if let Err(source) = self.players[side.other().index()].write_line(&line) {
            self.abort(
                MatchState::AbortedProtocolError,
                ForfeitReason::Send { line, source },
            );
        }
    }

    // The failing side is always the side to move: a failed read, parse or validation
    // leaves the turn unchanged, and a failed forward happens after the turn passed to
    // the receiver.
    fn abort(&mut self, state: MatchState, reason: ForfeitReason) {
        let side = self.board.next_side();
        error!(%side, ply = self.transcript.len(), "{side} player forfeits: {reason}");
        self.state = state;
        self.forfeit = Some((side, reason));
    }

    fn finish(mut self) -> MatchResult {
        for player in &mut self.players {
            player.quit();
        }
        let (score, outcome) = match self.forfeit.take() {
            None => {
                debug_assert_eq!(self.state, MatchState::Completed);
                (self.board.score(), MatchOutcome::Completed)
            }
            Some((side, reason)) => {
                let score = match side {
                    Side::White => -FORFEIT_SCORE,
                    Side::Black => FORFEIT_SCORE,
                };
                (score, MatchOutcome::Forfeit { side, reason })
            }
        };
        info!(
            score,
            plies = self.transcript.len(),
            white_time = ?self.think_time[0],
            black_time = ?self.think_time[1],
            "match finished"
        );
        MatchResult {
            transcript: std::mem::take(&mut self.transcript),
            score,
            think_time: self.think_time,
            outcome,
        }
    }
}

/// Runs a full match between two players; `first` moves first.
pub fn run_match<L: PlayerLink>(first: L, second: L) -> MatchResult {
    MatchController::new(first, second).run()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::rules::{replay, MAX_MOVES};
    use crate::testing::{scripted_game, ScriptedLink};

    fn codes(moves: &[Move]) -> Vec<String> {
        moves.iter().map(Move::to_string).collect()
    }

    #[test]
    fn full_match_is_completed() {
        let moves = scripted_game(3);
        let white = ScriptedLink::replying(moves.iter().step_by(2).map(Move::to_string));
        let black = ScriptedLink::replying(moves.iter().skip(1).step_by(2).map(Move::to_string));
        let (white_log, black_log) = (white.log(), black.log());

        let result = run_match(white, black);

        assert!(matches!(result.outcome, MatchOutcome::Completed));
        assert_eq!(result.transcript, moves);
        let board = replay(&result.encoded_transcript()).unwrap();
        assert_eq!(result.score, board.score());

        let mut expected_white = vec!["Start".to_owned()];
        // the last move is not forwarded: nothing is left to answer
        expected_white.extend(codes(&moves[1..MAX_MOVES - 1]).into_iter().step_by(2));
        assert_eq!(white_log.borrow().sent, expected_white);
        assert_eq!(
            black_log.borrow().sent,
            codes(&moves).into_iter().step_by(2).collect::<Vec<_>>()
        );
        assert_eq!(white_log.borrow().quits, 1);
        assert_eq!(black_log.borrow().quits, 1);
    }

    #[test]
    fn malformed_line_from_first_mover_forfeits() {
        let white = ScriptedLink::replying(["XX"]);
        let black = ScriptedLink::replying(Vec::<String>::new());
        let (white_log, black_log) = (white.log(), black.log());
        let mut controller = MatchController::new(white, black);

        assert_eq!(controller.step(), MatchState::InProgress);
        assert_eq!(controller.step(), MatchState::AbortedProtocolError);
        let result = controller.run();

        assert_eq!(result.score, -FORFEIT_SCORE);
        assert_eq!(result.forfeited(), Some(Side::White));
        assert!(matches!(
            result.outcome,
            MatchOutcome::Forfeit {
                reason: ForfeitReason::Malformed { .. },
                ..
            }
        ));
        assert_eq!(white_log.borrow().sent, vec!["Start"]);
        assert!(black_log.borrow().sent.is_empty());
        assert_eq!(white_log.borrow().quits, 1);
        assert_eq!(black_log.borrow().quits, 1);
    }

    #[test]
    fn malformed_line_from_second_mover_forfeits() {
        let white = ScriptedLink::replying(["C5"]);
        let black = ScriptedLink::replying(["Z0"]);
        let result = run_match(white, black);
        assert_eq!(result.score, FORFEIT_SCORE);
        assert_eq!(result.forfeited(), Some(Side::Black));
        assert_eq!(result.to_string(), "C5 +99");
    }

    #[test]
    fn illegal_move_lists_alternatives() {
        let white = ScriptedLink::replying(["A1"]);
        let black = ScriptedLink::replying(Vec::<String>::new());
        let result = run_match(white, black);

        assert_eq!(result.score, -FORFEIT_SCORE);
        match &result.outcome {
            MatchOutcome::Forfeit {
                side: Side::White,
                reason: reason @ ForfeitReason::IllegalMove { legal, .. },
            } => {
                assert_eq!(legal.len(), 4);
                assert_eq!(
                    reason.to_string(),
                    "invalid move A1 (valid moves: C5 D6 E3 F4)"
                );
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(result.to_string(), " -99");
    }

    #[test]
    fn end_of_file_from_second_mover_forfeits() {
        let white = ScriptedLink::replying(["C5", "E3"]);
        let black = ScriptedLink::replying(["C4"]);
        let result = run_match(white, black);
        assert_eq!(result.encoded_transcript(), "C5C4E3");
        assert_eq!(result.score, FORFEIT_SCORE);
        assert!(matches!(
            result.outcome,
            MatchOutcome::Forfeit {
                side: Side::Black,
                reason: ForfeitReason::Receive(TransportError::Eof),
            }
        ));
    }

    #[test]
    fn failed_forward_blames_the_receiver() {
        let white = ScriptedLink::replying(["C5"]);
        let black = ScriptedLink::refusing_writes();
        let black_log = black.log();
        let result = run_match(white, black);
        assert_eq!(result.encoded_transcript(), "C5");
        assert_eq!(result.forfeited(), Some(Side::Black));
        assert_eq!(result.score, FORFEIT_SCORE);
        assert_eq!(black_log.borrow().quits, 1);
    }

    /// Takes `delay` to answer every read.
    struct Slow {
        link: ScriptedLink,
        delay: Duration,
    }

    impl PlayerLink for Slow {
        fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
            self.link.write_line(line)
        }

        fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
            std::thread::sleep(self.delay);
            self.link.read_line()
        }

        fn quit(&mut self) {
            self.link.quit();
        }
    }

    #[test]
    fn think_time_is_charged_to_the_side_that_answers() {
        let white = Slow {
            link: ScriptedLink::replying(["C5", "E3"]),
            delay: Duration::from_millis(1),
        };
        // two reads: C4, then end of file
        let black = Slow {
            link: ScriptedLink::replying(["C4"]),
            delay: Duration::from_millis(100),
        };
        let mut controller = MatchController::new(white, black);
        controller.step();
        controller.step();
        assert_eq!(controller.state(), MatchState::InProgress);
        assert_eq!(controller.board().moves_played(), 1);

        let result = controller.run();
        assert_eq!(result.encoded_transcript(), "C5C4E3");
        let [white_time, black_time] = result.think_time;
        assert!(black_time >= Duration::from_millis(200), "{black_time:?}");
        assert!(white_time >= Duration::from_millis(2), "{white_time:?}");
        assert!(white_time < Duration::from_millis(200), "{white_time:?}");
    }

    #[test]
    fn failed_start_blames_the_first_mover() {
        let white = ScriptedLink::refusing_writes();
        let black = ScriptedLink::replying(Vec::<String>::new());
        let mut controller = MatchController::new(white, black);
        assert_eq!(controller.step(), MatchState::AbortedProtocolError);
        let result = controller.run();
        assert_eq!(result.score, -FORFEIT_SCORE);
        assert!(result.transcript.is_empty());
    }
}
