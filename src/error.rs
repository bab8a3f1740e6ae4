//! Error types for the public send/connect/queue boundaries.
//!
//! Transport *setup* (binding a socket, joining a multicast group) can fail
//! for many platform-specific reasons and keeps returning `anyhow::Result`
//! the way the original factory functions return `nullptr` on any failure.
//! These enums cover the failure kinds the original C++ implementation
//! distinguishes by negative return code on the per-call hot path.

use crate::identifier::Identifier;
use thiserror::Error;

/// Failure sending a [`crate::message::RawMessage`] through a transport.
#[derive(Debug, Error)]
pub enum SendError {
    /// The serialized frame would not fit in the transport's send buffer.
    #[error("message too large to serialize ({size} bytes)")]
    TooLarge {
        /// Size in bytes that failed to serialize.
        size: usize,
    },

    /// The destination identifier does not match this transport's address
    /// family, or could not be parsed into a socket address.
    #[error("invalid destination address: {0}")]
    InvalidAddress(String),

    /// The underlying `sendto` wrote fewer bytes than the frame size.
    #[error("short write: sent {sent} of {expected} bytes")]
    ShortWrite {
        /// Bytes actually written.
        sent: usize,
        /// Bytes the frame occupies.
        expected: usize,
    },

    /// The destination server has been dropped; a
    /// [`crate::envelope::ReceivedMessage::send_response`] can no longer
    /// reach it.
    #[error("server no longer exists")]
    ServerGone,

    /// Any other I/O failure from the underlying socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure hunting a peer within [`crate::client::Client::connect`].
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The hunt deadline elapsed before a pong was received.
    #[error("hunt for {0} timed out")]
    Timeout(Identifier),

    /// Sending the ping itself failed.
    #[error("failed to send hunt ping: {0}")]
    Send(#[from] SendError),
}

/// Failure adding a message to a [`crate::queue::ReceiveQueue`].
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue was at capacity; the message was discarded.
    #[error("receive queue is full")]
    Full,

    /// The queue has been stopped and will accept no further messages.
    #[error("receive queue has been stopped")]
    Stopped,
}
