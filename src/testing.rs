//! In-memory players for tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::client_handler::{Launcher, LogSink};
use crate::rules::{Board, Move, MAX_MOVES};
use crate::transport::{PlayerLink, TransportError};

#[derive(Debug, Default)]
pub struct LinkLog {
    pub sent: Vec<String>,
    pub quits: usize,
}

/// Answers each read with the next scripted line, then end of file.
#[derive(Debug, Default)]
pub struct ScriptedLink {
    replies: VecDeque<Vec<u8>>,
    refuse_writes: bool,
    log: Rc<RefCell<LinkLog>>,
}

impl ScriptedLink {
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedLink {
            replies: replies.into_iter().map(|s| s.into().into_bytes()).collect(),
            ..Default::default()
        }
    }

    pub fn refusing_writes() -> Self {
        ScriptedLink {
            refuse_writes: true,
            ..Default::default()
        }
    }

    pub fn log(&self) -> Rc<RefCell<LinkLog>> {
        self.log.clone()
    }
}

impl PlayerLink for ScriptedLink {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        if self.refuse_writes {
            return Err(TransportError::BrokenPipe);
        }
        self.log.borrow_mut().sent.push(line.to_owned());
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        self.replies.pop_front().ok_or(TransportError::Eof)
    }

    fn quit(&mut self) {
        self.log.borrow_mut().quits += 1;
    }
}

/// Hands out scripted players keyed by command, and records every launch.
#[derive(Debug, Default)]
pub struct ScriptedLauncher {
    pub scripts: Vec<(String, Vec<String>)>,
    pub launches: RefCell<Vec<(String, LogSink)>>,
}

impl Launcher for ScriptedLauncher {
    type Link = ScriptedLink;

    fn launch(&self, command: &str, stderr: &LogSink) -> anyhow::Result<ScriptedLink> {
        self.launches
            .borrow_mut()
            .push((command.to_owned(), stderr.clone()));
        let (_, replies) = self
            .scripts
            .iter()
            .find(|(name, _)| name == command)
            .ok_or_else(|| anyhow::anyhow!("unknown command '{command}'"))?;
        Ok(ScriptedLink::replying(replies.clone()))
    }
}

/// A complete legal game, picked by a small deterministic generator.
pub fn scripted_game(mut seed: u64) -> Vec<Move> {
    let mut board = Board::initial();
    let mut moves = Vec::with_capacity(MAX_MOVES);
    while !board.is_over() {
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let legal = board.legal_moves();
        let mv = legal[(seed >> 33) as usize % legal.len()];
        board.apply(mv);
        moves.push(mv);
    }
    moves
}
