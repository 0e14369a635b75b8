//! Fixed-depth negamax over the shared rules. No pruning, no tables.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::rules::{Board, Move, SIZE};

/// Bounds every evaluation stays within; anything outside is a bug.
pub const MIN_VALUE: i32 = -9999;
pub const MAX_VALUE: i32 = 9999;

/// Plies searched below each root candidate.
pub const DEFAULT_DEPTH: u32 = 3;

/// Static evaluation from the point of view of the side to move.
///
/// +1/-1 per own/opposing disc, and +2/-2 per empty cell next to a disc where the side to
/// move/its opponent would flip something.
pub fn evaluate(board: &Board) -> i32 {
    let me = board.next_side();
    let them = me.other();
    let mut score = 0;
    for row in 0..SIZE {
        for col in 0..SIZE {
            match board.get(row, col) {
                Some(side) if side == me => score += 1,
                Some(_) => score -= 1,
                None if board.has_occupied_neighbor(row, col) => {
                    if board.has_flips(me, row, col) {
                        score += 2;
                    }
                    if board.has_flips(them, row, col) {
                        score -= 2;
                    }
                }
                None => {}
            }
        }
    }
    score
}

/// Best value the side to move can reach `depth` plies ahead.
///
/// The board is mutated during the search and restored before returning.
pub fn negamax(board: &mut Board, depth: u32) -> i32 {
    if depth == 0 {
        return evaluate(board);
    }
    let moves = board.legal_moves();
    if moves.is_empty() {
        return evaluate(board);
    }
    let side = board.next_side();
    let mut best = MIN_VALUE - 1;
    for mv in moves {
        let flips = board.apply(mv);
        let value = -negamax(board, depth - 1);
        board.undo(mv, side, flips);
        best = best.max(value);
    }
    assert!(
        (MIN_VALUE..=MAX_VALUE).contains(&best),
        "search value {best} out of bounds"
    );
    best
}

/// Picks moves for the side to move. Randomness only breaks ties between equal moves.
#[derive(Debug)]
pub struct Searcher<R> {
    rng: R,
    depth: u32,
}

impl<R: Rng> Searcher<R> {
    pub fn new(rng: R, depth: u32) -> Self {
        Searcher { rng, depth }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The best move and its value, or `None` when there is no legal move.
    pub fn select_move(&mut self, original: &Board) -> Option<(Move, i32)> {
        let mut board = *original;
        let side = board.next_side();
        let mut moves = board.legal_moves();
        moves.shuffle(&mut self.rng);

        let mut best: Option<(Move, i32)> = None;
        for mv in moves {
            let flips = board.apply(mv);
            let value = -negamax(&mut board, self.depth);
            board.undo(mv, side, flips);
            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((mv, value));
            }
        }
        assert_eq!(&board, original, "board not restored after search");
        best
    }
}
