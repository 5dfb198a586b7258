//! trackread - dump floppy tracks or sectors.
//!
//! Writes the raw bytes to a file, or prints one hexdump per sector on stdout.

mod cli;
mod progress;

use anyhow::{Context, Result};
use humansize::{BINARY, format_size};
use tracing::{Level, info};
use trackread_core::{ReadSummary, Session, TrackError};
use trackread_io::Device;

use cli::Cli;
use progress::ProgressReporter;

fn main() -> Result<()> {
    let cli = Cli::parse_or_exit();
    init_logging(cli.verbose);

    let config = cli.session_config()?;
    let target = config.target.to_string();

    let mut session = match Session::open(config, Device::open) {
        Ok(session) => session,
        Err(err @ TrackError::Argument(_)) => {
            cli::print_usage();
            return Err(err.into());
        }
        Err(err) => return Err(err).with_context(|| format!("Failed to read {target}")),
    };

    let result = if session.config().output.is_some() {
        run_with_progress(&mut session, &target)
    } else {
        session.run(None)
    };
    session.close();

    let summary = result.with_context(|| format!("Failed to read {target}"))?;
    info!(
        "read {} in {} blocks from {}",
        format_size(summary.bytes, BINARY),
        summary.blocks,
        target
    );
    Ok(())
}

fn run_with_progress(
    session: &mut Session<Device>,
    target: &str,
) -> trackread_core::Result<ReadSummary> {
    let region = *session.region();
    let reporter = ProgressReporter::for_dump(region.byte_len(), region.sector_size, target);
    let update = |done: u64, _total: u64| reporter.update(done);

    let result = session.run(Some(&update));
    match &result {
        Ok(summary) => reporter.finish(&format!("Wrote {}", format_size(summary.bytes, BINARY))),
        Err(_) => reporter.abandon(),
    }
    result
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
