//! The transport capability interface and its two datagram implementations.
//!
//! A concrete socket variant (Unix-domain abstract-namespace, or UDP) only
//! needs to implement [`Transport`]; nothing above this layer cares which
//! one it's talking to. This replaces the original C++ implementation's
//! `SocketTraits<SocketType>` template specialization with a plain trait
//! object, per the socket-variant redesign flag.

pub mod udp;
pub mod unix_datagram;

use std::os::fd::RawFd;
use std::time::Duration;

use tracing::error;

use crate::error::SendError;
use crate::identifier::Identifier;
use crate::message::RawMessage;
use crate::{PING_REQ, PING_RSP};

pub use udp::UdpTransport;
pub use unix_datagram::UnixDatagramTransport;

/// A datagram socket capable of sending and receiving [`RawMessage`]s
/// addressed by [`Identifier`].
pub trait Transport: Send + Sync {
    /// This transport's own address.
    fn local_identifier(&self) -> &Identifier;

    /// The underlying file descriptor, for polling alongside other
    /// readiness sources.
    fn fd(&self) -> RawFd;

    /// Sends `message` to `to`.
    fn send(&self, message: &RawMessage, to: &Identifier) -> Result<(), SendError>;

    /// Waits up to `timeout` for a datagram, returning the decoded message
    /// and the sender's identifier.
    ///
    /// Returns `None` on timeout, on a malformed/truncated frame (logged
    /// and dropped — this is the single canonical drop point for bad
    /// frames), or if the socket has been closed out from under a blocked
    /// caller; none of these are distinguishable to the caller, matching
    /// the original implementation's "treat as nothing arrived" handling of
    /// the `EBADF` race.
    fn receive(&self, timeout: ReceiveTimeout) -> Option<(RawMessage, Identifier)>;

    /// Discards any datagram currently buffered in the kernel without
    /// decoding it, returning the number of bytes discarded.
    fn flush(&self) -> usize;

    /// Shuts down and closes the socket. Idempotent.
    fn close(&self);
}

/// How long [`Transport::receive`] should wait for a datagram.
#[derive(Debug, Clone, Copy)]
pub enum ReceiveTimeout {
    /// Return immediately if nothing is queued.
    Immediate,
    /// Wait up to the given duration.
    Bounded(Duration),
    /// Wait forever.
    Infinite,
}

impl ReceiveTimeout {
    /// Builds a `ReceiveTimeout` from the crate-wide millisecond convention:
    /// `0` is immediate, negative is infinite, positive is bounded.
    pub fn from_millis(timeout_ms: i64) -> Self {
        if timeout_ms == 0 {
            Self::Immediate
        } else if timeout_ms < 0 {
            Self::Infinite
        } else {
            Self::Bounded(Duration::from_millis(timeout_ms as u64))
        }
    }

    /// The value to hand to `poll(2)`: `-1` for infinite, otherwise the
    /// duration in milliseconds.
    pub fn poll_millis(&self) -> i32 {
        match self {
            Self::Immediate => 0,
            Self::Infinite => -1,
            Self::Bounded(d) => d.as_millis() as i32,
        }
    }
}

/// Answers `message` inline if it is a hunt ping, reporting whether it was.
///
/// Shared by [`crate::strategy::DirectStrategy`] and the queued-mode ingress
/// worker so both answer pings identically and neither ever hands a
/// `PING_REQ` on to a queue or a caller.
pub(crate) fn reply_to_ping(transport: &dyn Transport, message: &RawMessage, from: &Identifier) -> bool {
    if message.req_id() != PING_REQ {
        return false;
    }
    let pong = RawMessage::new(PING_RSP);
    if let Err(e) = transport.send(&pong, from) {
        error!("failed to answer hunt ping from {from}: {e}");
    }
    true
}
