use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use disc_arbiter::logger::{init_logger, LogTarget};
use disc_arbiter::prelude::*;

/// Runs matches between two player programs and reports the results.
#[derive(Parser, Debug)]
#[command(name = "arbiter")]
struct Args {
    /// Rounds of two matches each, colors swapped; 0 or less plays a single match
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    rounds: i32,

    /// Prefix of the per-match player log files; "-" forwards player stderr
    #[arg(long)]
    logs: Option<String>,

    /// Trace every move
    #[arg(long)]
    verbose: bool,

    /// Command starting the first player
    player1: String,

    /// Command starting the second player
    player2: String,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let env = Configuration::from_env();
    let config = Configuration::new()
        .with_rounds(args.rounds)
        .with_logs(LogPolicy::from_arg(args.logs.as_deref()))
        .with_verbose(args.verbose || env.verbose())
        .with_log_to_file(env.log_to_file());

    let target = if config.log_to_file() {
        LogTarget::File
    } else {
        LogTarget::Stderr
    };
    if let Err(e) = init_logger(target, config.verbose()) {
        eprintln!("{e:#}");
    }

    let tournament = Tournament::new([args.player1, args.player2], config);
    let result = tournament.run(&ShellLauncher, |game, result| {
        println!("{}", report_line(game, result));
    });
    match result {
        Ok(summary) => {
            if summary.games > 1 {
                println!();
                print!("{summary}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
