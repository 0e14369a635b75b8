use std::io;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use disc_arbiter::logger::{init_logger, LogTarget};
use disc_arbiter::player::search::{Searcher, DEFAULT_DEPTH};
use disc_arbiter::player::SearchPlayer;

/// Reference player: fixed-depth negamax, protocol on stdin/stdout, logs on stderr.
#[derive(Parser, Debug)]
#[command(name = "player")]
struct Args {
    /// Plies searched below each candidate move
    #[arg(long, default_value_t = DEFAULT_DEPTH)]
    depth: u32,

    /// Seed for tie-breaking between equally good moves
    #[arg(long)]
    seed: Option<u64>,

    /// Log every selected move
    #[arg(long)]
    verbose: bool,
}

fn default_seed() -> u64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    (u64::from(std::process::id()) << 16) ^ secs
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logger(LogTarget::Stderr, args.verbose) {
        eprintln!("{e:#}");
    }

    let seed = args.seed.unwrap_or_else(default_seed);
    let searcher = Searcher::new(StdRng::seed_from_u64(seed), args.depth);
    info!(seed, depth = searcher.depth(), "player starting");

    let mut player = SearchPlayer::new(searcher);
    match player.play(io::stdin().lock(), io::stdout().lock()) {
        Ok(exit) => {
            info!(?exit, "player done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
