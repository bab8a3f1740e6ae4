//! Starts a queued Unix-domain server and echoes request id 1 back as
//! request id 2. Runs until killed (Ctrl-C).

#[path = "common/mod.rs"]
mod common;

use clap::Parser;
use linkwire::{Dispatcher, RawMessage, Server};
use tracing::info;

#[derive(Parser)]
#[command(about = "A queued Unix-domain echo server")]
struct Args {
    /// Abstract-namespace name to bind the server under.
    #[arg(default_value = "linkwire-echo")]
    name: String,

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

    let server = Server::unix_queued(&args.name)?;
    let dispatcher = Dispatcher::new(server);
    dispatcher.start();

    dispatcher.register(1, |envelope| {
        info!("received req 1 from {}, replying with req 2", envelope.from());
        if let Err(e) = envelope.send_response(&RawMessage::from_slice(2, envelope.message().payload())) {
            tracing::error!("failed to send reply: {e}");
            return -1;
        }
        0
    });

    info!("echo server listening on '{}'", args.name);
    loop {
        dispatcher.handle_message(-1);
    }
}
