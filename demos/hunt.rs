//! Hunts a named Unix-domain peer and reports success or failure and the
//! elapsed time.

#[path = "common/mod.rs"]
mod common;

use std::time::Instant;

use clap::Parser;
use linkwire::Client;
use tracing::{error, info};

#[derive(Parser)]
#[command(about = "Hunt a named Unix-domain peer until it answers or a timeout elapses")]
struct Args {
    /// Abstract-namespace name of the peer to hunt.
    name: String,

    /// Timeout in milliseconds; negative means hunt forever.
    #[arg(short, long, default_value_t = 5_000)]
    timeout_ms: i64,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write detailed logs here (daily-rotated), or to "stderr".
    #[arg(long)]
    log_file: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = common::logging::init(args.verbose, args.log_file.as_deref());

    let client = Client::unix(&args.name)?;
    let started = Instant::now();
    match client.connect(args.timeout_ms) {
        Ok(()) => {
            info!("found '{}' after {:?}", args.name, started.elapsed());
            Ok(())
        }
        Err(e) => {
            error!("failed to find '{}' after {:?}: {e}", args.name, started.elapsed());
            Err(e.into())
        }
    }
}
