use std::fs::File;

use anyhow::Context;
use time::{
    format_description::{self, parse},
    OffsetDateTime, UtcOffset,
};
use tracing::{subscriber::set_global_default, Level};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, FmtSubscriber};

/// Where the process's own diagnostics go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// A new file in the current directory, named after the current time.
    File,
}

pub fn init_logger(target: LogTarget, verbose: bool) -> anyhow::Result<()> {
    let writer = match target {
        LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogTarget::File => {
            let file_name = get_log_file_name()?;
            let file = File::create(&file_name)
                .with_context(|| format!("could not create log file {file_name}"))?;
            BoxMakeWriter::new(file)
        }
    };
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = tracing_subscriber::fmt::time::OffsetTime::new(
        local_offset,
        format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
            .context("invalid time format")?,
    );

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if verbose { Level::TRACE } else { Level::INFO })
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(writer)
        .finish();

    set_global_default(subscriber).context("could not set global default tracing subscriber")
}

fn get_log_file_name() -> anyhow::Result<String> {
    let format = parse("[year]-[month]-[day]_[hour]:[minute]:[second]_log.txt")
        .context("invalid log file name format")?;
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&format).context("could not format log file name")
}
