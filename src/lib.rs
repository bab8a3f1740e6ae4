//! `linkwire` is a message-oriented IPC library built on connectionless
//! datagram sockets: Unix-domain (abstract namespace) and UDP, including
//! multicast and broadcast.
//!
//! A process exposes a named [`server::Server`] that can both send datagrams
//! to peers and receive datagrams addressed to it. Each datagram carries an
//! application-defined 32-bit request id plus an opaque payload (see
//! [`message::RawMessage`]). Peers are named by an [`identifier::Identifier`],
//! discovered by hunting ([`client::Client::connect`]), and replied to
//! through the [`envelope::ReceivedMessage`] handed back from a receive.
//!
//! This crate does not provide guaranteed delivery, fragmentation, transport
//! security, or a service directory. Back-pressure is a bounded receive
//! queue; a full queue drops the newest datagram and logs a warning rather
//! than blocking the sender.

pub mod client;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod event_signal;
pub mod identifier;
pub mod logging;
pub mod message;
pub mod queue;
pub mod server;
pub mod strategy;
pub mod transport;

pub use client::Client;
pub use dispatcher::Dispatcher;
pub use envelope::ReceivedMessage;
pub use error::{ConnectError, QueueError, SendError};
pub use identifier::Identifier;
pub use message::RawMessage;
pub use server::Server;

/// The current version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate-wide default values, grounded in the original implementation's
/// constants (`LINX_DEFAULT_QUEUE_SIZE`, the hunt ping/timeout constants).
pub mod defaults {
    /// Default bounded receive queue capacity.
    pub const QUEUE_SIZE: usize = 100;
    /// Per-attempt timeout used while hunting a peer, in milliseconds.
    pub const HUNT_PING_TIMEOUT_MS: u64 = 100;
    /// Interval between ingress worker poll attempts, in milliseconds.
    pub const INGRESS_POLL_TIMEOUT_MS: u64 = 100;
    /// Sentinel meaning "wait forever".
    pub const INFINITE_TIMEOUT_MS: i64 = -1;
    /// Sentinel meaning "return immediately if nothing is available".
    pub const IMMEDIATE_TIMEOUT_MS: i64 = 0;
    /// Largest frame (4-byte header plus payload) a transport will attempt
    /// to send, matching the original implementation's fixed-size send
    /// buffer. A larger [`crate::message::RawMessage`] is rejected with
    /// [`crate::error::SendError::TooLarge`] before any socket call is made.
    pub const MAX_MESSAGE_SIZE: usize = 65_507;
}

/// Request ids below this value are reserved for internal use (the hunt
/// ping/pong handshake) and are never delivered to a queue, a direct
/// receive, or a callback dispatcher.
pub const IPC_SIG_BASE: u32 = 0x1000_0000;

/// Reserved request id for a hunt ping.
pub const PING_REQ: u32 = IPC_SIG_BASE - 2;
/// Reserved request id for a hunt pong.
pub const PING_RSP: u32 = IPC_SIG_BASE - 1;
