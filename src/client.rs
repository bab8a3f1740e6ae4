//! A handle to a named peer: send/receive through a small local server
//! bound to a unique address, plus a hunt/connect handshake to wait for the
//! peer to exist.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, trace};
use uuid::Uuid;

use crate::defaults::HUNT_PING_TIMEOUT_MS;
use crate::envelope::ReceivedMessage;
use crate::error::{ConnectError, SendError};
use crate::identifier::Identifier;
use crate::message::RawMessage;
use crate::server::Server;
use crate::transport::udp::UdpTransport;
use crate::transport::unix_datagram::UnixDatagramTransport;
use crate::{PING_REQ, PING_RSP};

/// A handle to a single named peer, reachable through its own small
/// direct-mode server.
///
/// Two clients are equal if they address the same peer, mirroring the
/// original implementation comparing clients by their target's name.
pub struct Client {
    server: Arc<Server>,
    target: Identifier,
}

impl Client {
    /// Builds a client talking to `transport`'s peer at `target`.
    pub fn with_transport(transport: Arc<dyn crate::transport::Transport>, target: Identifier) -> Self {
        Self {
            server: Server::direct(transport),
            target,
        }
    }

    /// Opens a Unix-domain client bound to a name derived from `target`,
    /// ready to send to and hunt the peer named `target`.
    pub fn unix(target: impl Into<String>) -> anyhow::Result<Self> {
        let target = target.into();
        let own_name = format!("{target}_client_{}", Uuid::new_v4());
        let transport = Arc::new(UnixDatagramTransport::bind(own_name)?);
        Ok(Self::with_transport(transport, Identifier::path(target)))
    }

    /// Opens a UDP client ready to send to and hunt the peer at
    /// `target_ip:target_port`. Automatically configures broadcast/
    /// multicast send options if `target_ip` calls for them.
    pub fn udp(target_ip: impl Into<String>, target_port: u16) -> anyhow::Result<Self> {
        let target_ip = target_ip.into();
        let transport = Arc::new(UdpTransport::bind_client(&target_ip)?);
        Ok(Self::with_transport(
            transport,
            Identifier::port(target_ip, target_port),
        ))
    }

    /// The peer this client addresses.
    pub fn target(&self) -> &Identifier {
        &self.target
    }

    /// Sends `message` to the target peer.
    pub fn send(&self, message: &RawMessage) -> Result<(), SendError> {
        self.server.send(message, &self.target)
    }

    /// Waits up to `timeout_ms` for a message from the target peer matching
    /// `sigsel` (empty selector matches anything).
    pub fn receive(&self, timeout_ms: i64, sigsel: &[u32]) -> Option<ReceivedMessage> {
        self.server.receive(timeout_ms, sigsel, Some(&self.target))
    }

    /// Sends `message`, then waits up to `timeout_ms` for a matching reply.
    /// Returns `None` immediately if the send itself fails.
    pub fn send_receive(
        &self,
        message: &RawMessage,
        timeout_ms: i64,
        sigsel: &[u32],
    ) -> Option<ReceivedMessage> {
        self.send(message).ok()?;
        self.receive(timeout_ms, sigsel)
    }

    /// Pings the target peer repeatedly until it replies or `timeout_ms`
    /// elapses. A negative `timeout_ms` hunts forever.
    ///
    /// Each attempt waits at most
    /// [`crate::defaults::HUNT_PING_TIMEOUT_MS`] for a pong before retrying,
    /// matching the original implementation's fixed per-attempt timeout.
    pub fn connect(&self, timeout_ms: i64) -> Result<(), ConnectError> {
        let deadline = (timeout_ms >= 0)
            .then(|| Instant::now() + Duration::from_millis(timeout_ms as u64));

        loop {
            self.send(&RawMessage::new(PING_REQ))?;
            if self
                .receive(HUNT_PING_TIMEOUT_MS as i64, &[PING_RSP])
                .is_some()
            {
                info!("hunt succeeded for {}", self.target);
                return Ok(());
            }
            trace!("hunt attempt for {} timed out, retrying", self.target);
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(ConnectError::Timeout(self.target.clone()));
                }
            }
        }
    }
}

impl PartialEq for Client {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}

impl Eq for Client {}
