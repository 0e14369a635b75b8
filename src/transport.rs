//! Line framing between the arbiter and a player.
//!
//! Every message is exactly one `\n`-terminated line, and every read on the underlying pipe
//! must return exactly one such line: no partial line, no second line, nothing after the
//! newline. Anything else is a [`TransportError`] and is never retried.

use std::fmt::Write as _;
use std::io::{self, ErrorKind, Read, Write};

use thiserror::Error;

use crate::rules::Move;

/// Largest line accepted in a single read.
pub const MAX_LINE: usize = 1024;

/// A message of the wire grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Sent once, only to the first mover, before anything is read from it.
    Start,
    /// Sent once at teardown.
    Quit,
    Move(Move),
}

impl Message {
    /// The line for this message, without the newline.
    pub fn encode(&self) -> String {
        match self {
            Message::Start => "Start".to_owned(),
            Message::Quit => "Quit".to_owned(),
            Message::Move(mv) => mv.to_string(),
        }
    }

    /// Returns `None` for anything outside the grammar.
    pub fn decode(line: &[u8]) -> Option<Message> {
        match line {
            b"Start" => Some(Message::Start),
            b"Quit" => Some(Message::Quit),
            code => Move::parse(code).ok().map(Message::Move),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("end of file reached")]
    Eof,
    #[error("end of line not found in {}", escape(.0))]
    MissingNewline(Vec<u8>),
    #[error("extra data after end of line in {}", escape(.0))]
    TrailingData(Vec<u8>),
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    #[error("receiver closed its input")]
    BrokenPipe,
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
    #[error("write end already closed")]
    Closed,
}

/// Capability the match loop needs from a player: exchange lines, then shut it down.
///
/// The real implementation is a child process
/// ([`ClientHandler`](crate::client_handler::ClientHandler)); tests use in-memory fakes.
pub trait PlayerLink {
    /// Sends one line; `line` must not contain a newline.
    fn write_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Blocks until one complete line arrives. The newline is stripped.
    fn read_line(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Best-effort `Quit`, then release everything. Must be safe to call more than once.
    fn quit(&mut self);
}

/// Strict framing over a reader/writer pair.
#[derive(Debug)]
pub struct Transport<R, W> {
    reader: Option<R>,
    writer: Option<W>,
}

impl<R: Read, W: Write> Transport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Transport {
            reader: Some(reader),
            writer: Some(writer),
        }
    }

    /// Writes `line` plus a newline in one go. A closed receiver is reported, not fatal.
    pub fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let writer = self.writer.as_mut().ok_or(TransportError::Closed)?;
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        writer
            .write_all(&buf)
            .and_then(|()| writer.flush())
            .map_err(|e| match e.kind() {
                ErrorKind::BrokenPipe => TransportError::BrokenPipe,
                _ => TransportError::Write(e),
            })
    }

    pub fn send(&mut self, message: Message) -> Result<(), TransportError> {
        self.write_line(&message.encode())
    }

    /// One read, one line.
    pub fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        let reader = self.reader.as_mut().ok_or(TransportError::Eof)?;
        let mut buf = [0u8; MAX_LINE];
        let n = loop {
            match reader.read(&mut buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::Read(e)),
            }
        };
        let data = &buf[..n];
        match data.iter().position(|b| *b == b'\n') {
            _ if n == 0 => Err(TransportError::Eof),
            None => Err(TransportError::MissingNewline(data.to_vec())),
            Some(end) if end + 1 != n => Err(TransportError::TrailingData(data.to_vec())),
            Some(end) => Ok(data[..end].to_vec()),
        }
    }

    /// Drops the write end, so the receiver sees end of file.
    pub fn close_writer(&mut self) {
        self.writer = None;
    }

    pub fn close_reader(&mut self) {
        self.reader = None;
    }
}

/// Quoted, printable rendering of raw wire bytes, e.g. `"A1\x0d"`.
pub fn escape(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() + 2);
    s.push('"');
    for &b in bytes {
        match b {
            b'\\' | b'"' => {
                s.push('\\');
                s.push(b as char);
            }
            32..=126 => s.push(b as char),
            _ => {
                let _ = write!(s, "\\x{b:02x}");
            }
        }
    }
    s.push('"');
    s
}
