//! The UDP analogue of `echo`: binds a queued UDP server, optionally joined
//! to a multicast group, and echoes request id 1 back as request id 2.

#[path = "common/mod.rs"]
mod common;

use clap::Parser;
use linkwire::{Dispatcher, RawMessage, Server};
use tracing::{error, info};

#[derive(Parser)]
#[command(about = "A queued UDP echo server, optionally multicast-joined")]
struct Args {
    /// UDP port to bind.
    #[arg(default_value_t = 9100)]
    port: u16,

    /// Join this multicast group instead of listening on the wildcard
    /// address alone.
    #[arg(short, long)]
    multicast_group: Option<String>,

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

    let server = Server::udp_queued(args.port, args.multicast_group.as_deref())?;
    let dispatcher = Dispatcher::new(server);
    dispatcher.start();

    dispatcher.register(1, |envelope| {
        info!("received req 1 from {}, replying with req 2", envelope.from());
        if let Err(e) = envelope.send_response(&RawMessage::from_slice(2, envelope.message().payload())) {
            error!("failed to send reply: {e}");
            return -1;
        }
        0
    });

    info!(
        "udp echo server listening on port {} (multicast group: {:?})",
        args.port, args.multicast_group
    );
    loop {
        dispatcher.handle_message(-1);
    }
}
