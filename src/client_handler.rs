use std::fs::File;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use anyhow::{anyhow, Context};
use tracing::{debug, instrument, warn};

use crate::transport::{Message, PlayerLink, Transport, TransportError};

/// Where a player's standard error goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Discard,
    /// Inherit the arbiter's standard error.
    Forward,
    /// Created (or truncated) at spawn time.
    File(PathBuf),
}

impl LogSink {
    fn stdio(&self) -> anyhow::Result<Stdio> {
        Ok(match self {
            LogSink::Discard => Stdio::null(),
            LogSink::Forward => Stdio::inherit(),
            LogSink::File(path) => {
                let file = File::create(path)
                    .with_context(|| format!("cannot open log file {}", path.display()))?;
                Stdio::from(file)
            }
        })
    }
}

/// Something that can start players. Lets the tournament run without real processes in tests.
pub trait Launcher {
    type Link: PlayerLink;

    fn launch(&self, command: &str, stderr: &LogSink) -> anyhow::Result<Self::Link>;
}

/// Starts each player as `/bin/sh -c <command>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellLauncher;

impl Launcher for ShellLauncher {
    type Link = ClientHandler;

    fn launch(&self, command: &str, stderr: &LogSink) -> anyhow::Result<ClientHandler> {
        ClientHandler::spawn(command, stderr)
    }
}

/// A player running as a child process, wired to the arbiter through two private pipes.
///
/// The child is shut down exactly once: by [`PlayerLink::quit`], or on drop if that never
/// happened.
#[derive(Debug)]
pub struct ClientHandler {
    command: String,
    child: Child,
    transport: Transport<ChildStdout, ChildStdin>,
    cleaned_up: bool,
}

impl ClientHandler {
    #[instrument(skip(stderr))]
    pub fn spawn(command: &str, stderr: &LogSink) -> anyhow::Result<ClientHandler> {
        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(stderr.stdio()?)
            .spawn()
            .with_context(|| format!("could not spawn '{command}'"))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(anyhow!("child pipes for '{command}' are missing"));
        };
        debug!(pid = child.id(), "player spawned");

        Ok(ClientHandler {
            command: command.to_owned(),
            child,
            transport: Transport::new(stdout, stdin),
            cleaned_up: false,
        })
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl PlayerLink for ClientHandler {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.transport.write_line(line)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        self.transport.read_line()
    }

    fn quit(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;

        // the player may already be gone
        if let Err(e) = self.transport.send(Message::Quit) {
            debug!(command = %self.command, "could not send Quit: {e}");
        }
        self.transport.close_writer();
        match self.child.wait() {
            Ok(status) if status.success() => {
                debug!(pid = self.id(), command = %self.command, "player exited normally");
            }
            Ok(status) => {
                warn!(pid = self.id(), command = %self.command, "player did not exit normally: {status}");
            }
            Err(e) => warn!(command = %self.command, "could not wait for player: {e}"),
        }
        self.transport.close_reader();
    }
}

impl Drop for ClientHandler {
    fn drop(&mut self) {
        self.quit();
    }
}
