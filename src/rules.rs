//! Game rules shared by the arbiter (validation) and the reference player (search).
//!
//! Everything here is pure: a [`Board`] is a plain value owned by the caller, and every
//! operation either inspects it or mutates it in place through `&mut`.
//!
//! Two rules differ from the usual disc-flipping game:
//! - A move that flips nothing is legal, but only when no empty cell next to a disc would
//!   flip anything for the side to move.
//! - A match ends after exactly [`MAX_MOVES`] plies, whatever the legal moves are.

use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;

/// Number of rows and columns.
pub const SIZE: usize = 8;

/// Number of plies in a complete match (every non-initial cell gets filled once).
pub const MAX_MOVES: usize = 60;

/// One of the two sides. `White` always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// First mover.
    White,
    /// Second mover.
    Black,
}

impl Side {
    /// The opposing side.
    pub fn other(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// 0 for the first mover, 1 for the second mover.
    pub fn index(self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }

    /// The side to move after `moves_played` plies.
    pub fn from_parity(moves_played: usize) -> Side {
        if moves_played % 2 == 0 {
            Side::White
        } else {
            Side::Black
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

/// A target cell. Encoded on the wire as a row letter `A`..`H` followed by a column digit `1`..`8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    row: u8,
    col: u8,
}

impl Move {
    /// Returns `None` when the coordinates are off the board.
    pub fn new(row: usize, col: usize) -> Option<Move> {
        if valid_coords(row as isize, col as isize) {
            Some(Move {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    pub fn row(self) -> usize {
        self.row as usize
    }

    pub fn col(self) -> usize {
        self.col as usize
    }

    /// Decode a raw wire line (without its newline).
    pub fn parse(code: &[u8]) -> Result<Move, ParseMoveError> {
        let [row, col] = code else {
            return Err(ParseMoveError::Length(code.len()));
        };
        let row = row.wrapping_sub(b'A') as usize;
        let col = col.wrapping_sub(b'1') as usize;
        if row >= SIZE {
            return Err(ParseMoveError::Row(code[0]));
        }
        if col >= SIZE {
            return Err(ParseMoveError::Column(code[1]));
        }
        Ok(Move {
            row: row as u8,
            col: col as u8,
        })
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            char::from(b'A' + self.row),
            char::from(b'1' + self.col)
        )
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::parse(s.as_bytes())
    }
}

/// Why a line is not a move code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMoveError {
    #[error("expected 2 characters, got {0}")]
    Length(usize),
    #[error("row {:?} is not in A..H", char::from(*.0))]
    Row(u8),
    #[error("column {:?} is not in 1..8", char::from(*.0))]
    Column(u8),
}

fn valid_coords(r: isize, c: isize) -> bool {
    (0..SIZE as isize).contains(&r) && (0..SIZE as isize).contains(&c)
}

const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Cells plus the number of plies played. The side to move follows from the parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Option<Side>; SIZE]; SIZE],
    moves_played: usize,
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl Board {
    /// Four discs on the central 2x2 block, same sides on the diagonals.
    pub fn initial() -> Board {
        let mut cells = [[None; SIZE]; SIZE];
        let h = SIZE / 2;
        cells[h - 1][h - 1] = Some(Side::White);
        cells[h - 1][h] = Some(Side::Black);
        cells[h][h - 1] = Some(Side::Black);
        cells[h][h] = Some(Side::White);
        Board {
            cells,
            moves_played: 0,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Side> {
        self.cells[row][col]
    }

    pub fn moves_played(&self) -> usize {
        self.moves_played
    }

    /// The side whose turn it is.
    pub fn next_side(&self) -> Side {
        Side::from_parity(self.moves_played)
    }

    /// True once [`MAX_MOVES`] plies were played.
    pub fn is_over(&self) -> bool {
        self.moves_played >= MAX_MOVES
    }

    pub fn count(&self, side: Side) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| **cell == Some(side))
            .count()
    }

    /// Disc differential: white discs minus black discs.
    pub fn score(&self) -> i32 {
        self.count(Side::White) as i32 - self.count(Side::Black) as i32
    }

    /// True if any of the up to 8 surrounding cells holds a disc.
    pub fn has_occupied_neighbor(&self, row: usize, col: usize) -> bool {
        DIRECTIONS.iter().any(|(dr, dc)| {
            let r = row as isize + dr;
            let c = col as isize + dc;
            valid_coords(r, c) && self.cells[r as usize][c as usize].is_some()
        })
    }

    /// Visits every cell that `side` would flip by playing at (`row`, `col`).
    ///
    /// In each direction, a run of opposing discs is flipped when it is closed by a disc of
    /// `side`; a run ending on an empty cell or the edge flips nothing. `visit` returns
    /// `false` to stop early, in which case this returns `false` too.
    pub fn for_each_flip<F>(&self, side: Side, row: usize, col: usize, mut visit: F) -> bool
    where
        F: FnMut(usize, usize) -> bool,
    {
        for (dr, dc) in DIRECTIONS {
            let mut n = 1;
            let bracket = loop {
                let r = row as isize + n * dr;
                let c = col as isize + n * dc;
                if !valid_coords(r, c) {
                    break 0;
                }
                match self.cells[r as usize][c as usize] {
                    None => break 0,
                    Some(s) if s == side => break n,
                    Some(_) => n += 1,
                }
            };
            for n in 1..bracket {
                let r = (row as isize + n * dr) as usize;
                let c = (col as isize + n * dc) as usize;
                if !visit(r, c) {
                    return false;
                }
            }
        }
        true
    }

    /// True if playing at (`row`, `col`) flips at least one disc for `side`.
    pub fn has_flips(&self, side: Side, row: usize, col: usize) -> bool {
        !self.for_each_flip(side, row, col, |_, _| false)
    }

    /// Legal moves for the side to move, in row-major order.
    ///
    /// Candidates are empty cells next to a disc. If any candidate flips something, only the
    /// flipping candidates are legal; otherwise all candidates are.
    pub fn legal_moves(&self) -> Vec<Move> {
        let side = self.next_side();
        let mut candidates = Vec::new();
        for row in 0..SIZE {
            for col in 0..SIZE {
                if self.cells[row][col].is_none() && self.has_occupied_neighbor(row, col) {
                    candidates.push(Move {
                        row: row as u8,
                        col: col as u8,
                    });
                }
            }
        }
        let flipping: Vec<Move> = candidates
            .iter()
            .copied()
            .filter(|mv| self.has_flips(side, mv.row(), mv.col()))
            .collect();
        if flipping.is_empty() {
            candidates
        } else {
            flipping
        }
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.legal_moves().contains(&mv)
    }

    /// Places a disc for the side to move, flips, and passes the turn.
    ///
    /// Legality is the caller's business; the target cell must be empty. The returned
    /// [`Flips`] is what [`Board::undo`] needs to take the move back.
    pub fn apply(&mut self, mv: Move) -> Flips {
        let side = self.next_side();
        debug_assert!(self.cells[mv.row()][mv.col()].is_none());
        let mut flips = Flips::default();
        self.for_each_flip(side, mv.row(), mv.col(), |r, c| {
            flips.insert(r, c);
            true
        });
        self.toggle(flips);
        self.cells[mv.row()][mv.col()] = Some(side);
        self.moves_played += 1;
        flips
    }

    /// Exact inverse of [`Board::apply`] for a move that `side` just played.
    pub fn undo(&mut self, mv: Move, side: Side, flips: Flips) {
        debug_assert!(self.moves_played > 0);
        debug_assert_eq!(self.cells[mv.row()][mv.col()], Some(side));
        debug_assert_eq!(Side::from_parity(self.moves_played - 1), side);
        self.cells[mv.row()][mv.col()] = None;
        self.toggle(flips);
        self.moves_played -= 1;
    }

    fn toggle(&mut self, flips: Flips) {
        for (r, c) in flips.cells() {
            self.cells[r][c] = self.cells[r][c].map(Side::other);
        }
    }
}

/// Set of cells flipped by one move, one bit per cell in row-major order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flips(u64);

impl Flips {
    fn insert(&mut self, row: usize, col: usize) {
        self.0 |= 1 << (row * SIZE + col);
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, row: usize, col: usize) -> bool {
        self.0 & (1 << (row * SIZE + col)) != 0
    }

    pub fn cells(self) -> impl Iterator<Item = (usize, usize)> {
        (0..SIZE * SIZE)
            .filter(move |i| self.0 & (1 << i) != 0)
            .map(|i| (i / SIZE, i % SIZE))
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " ")?;
        for col in 0..SIZE {
            write!(f, " {}", col + 1)?;
        }
        writeln!(f)?;
        for (row, cells) in self.cells.iter().enumerate() {
            write!(f, "{}", char::from(b'A' + row as u8))?;
            for cell in cells {
                let c = match cell {
                    None => '.',
                    Some(Side::White) => 'O',
                    Some(Side::Black) => 'X',
                };
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Concatenated move codes, e.g. `"D3C5"`.
pub fn encode_transcript(moves: &[Move]) -> String {
    moves.iter().map(Move::to_string).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("transcript has odd length {0}")]
    OddLength(usize),
    #[error("ply {ply}: {source}")]
    Malformed {
        ply: usize,
        #[source]
        source: ParseMoveError,
    },
    #[error("ply {ply}: {mv} is not a legal move")]
    Illegal { ply: usize, mv: Move },
}

/// Replays a transcript from the initial board, checking every move.
pub fn replay(transcript: &str) -> Result<Board, ReplayError> {
    let bytes = transcript.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(ReplayError::OddLength(bytes.len()));
    }
    let mut board = Board::initial();
    for (ply, code) in bytes.chunks(2).enumerate() {
        let mv = Move::parse(code).map_err(|source| ReplayError::Malformed { ply, source })?;
        if board.is_over() || !board.is_legal(mv) {
            return Err(ReplayError::Illegal { ply, mv });
        }
        board.apply(mv);
    }
    Ok(board)
}
