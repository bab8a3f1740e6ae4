//! The endpoint that owns a transport, an optional receive queue, and an
//! optional ingress worker thread.
//!
//! A server built in queued mode spawns a background thread that polls the
//! transport, answers hunt pings inline (never delivering them, or a stray
//! pong, to the queue), and otherwise enqueues everything it receives for
//! later pickup by [`Server::receive`]. A server built in direct mode has no
//! worker and no queue: `receive` reads the transport itself, on the
//! caller's thread, answering hunt pings inline the same way before
//! checking the selector — see [`crate::strategy::DirectStrategy`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::defaults::{INGRESS_POLL_TIMEOUT_MS, QUEUE_SIZE};
use crate::envelope::ReceivedMessage;
use crate::error::SendError;
use crate::identifier::Identifier;
use crate::message::RawMessage;
use crate::queue::ReceiveQueue;
use crate::strategy::{DirectStrategy, QueuedStrategy, ReceiveStrategy};
use crate::transport::udp::UdpTransport;
use crate::transport::unix_datagram::UnixDatagramTransport;
use crate::transport::{reply_to_ping, ReceiveTimeout, Transport};
use crate::PING_RSP;

/// An IPC endpoint: a transport plus (in queued mode) the machinery to
/// buffer incoming messages in the background.
pub struct Server {
    transport: Arc<dyn Transport>,
    queue: Option<Arc<ReceiveQueue>>,
    strategy: Box<dyn ReceiveStrategy>,
    worker: Mutex<Option<JoinHandle<()>>>,
    running: Arc<AtomicBool>,
}

impl Server {
    /// Builds a direct-mode server: no background worker, no queue.
    pub fn direct(transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new(Self {
            strategy: Box::new(DirectStrategy::new(transport.clone())),
            transport,
            queue: None,
            worker: Mutex::new(None),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Builds a queued-mode server with a bounded receive queue of
    /// `capacity` entries. Call [`Server::start`] to spawn the ingress
    /// worker.
    pub fn queued(transport: Arc<dyn Transport>, capacity: usize) -> anyhow::Result<Arc<Self>> {
        let queue = Arc::new(ReceiveQueue::new(capacity)?);
        Ok(Arc::new(Self {
            strategy: Box::new(QueuedStrategy::new(queue.clone())),
            transport,
            queue: Some(queue),
            worker: Mutex::new(None),
            running: Arc::new(AtomicBool::new(false)),
        }))
    }

    /// Opens a Unix-domain abstract-namespace socket and wraps it as a
    /// direct-mode server.
    pub fn unix_direct(name: impl Into<String>) -> anyhow::Result<Arc<Self>> {
        Ok(Self::direct(Arc::new(UnixDatagramTransport::bind(name)?)))
    }

    /// Opens a Unix-domain abstract-namespace socket and wraps it as a
    /// queued-mode server with the default queue capacity.
    pub fn unix_queued(name: impl Into<String>) -> anyhow::Result<Arc<Self>> {
        Self::queued(Arc::new(UnixDatagramTransport::bind(name)?), QUEUE_SIZE)
    }

    /// Opens a UDP socket (optionally joined to a multicast group) and
    /// wraps it as a direct-mode server.
    pub fn udp_direct(port: u16, multicast_group: Option<&str>) -> anyhow::Result<Arc<Self>> {
        Ok(Self::direct(Arc::new(UdpTransport::bind_server(
            port,
            multicast_group,
        )?)))
    }

    /// Opens a UDP socket (optionally joined to a multicast group) and
    /// wraps it as a queued-mode server with the default queue capacity.
    pub fn udp_queued(port: u16, multicast_group: Option<&str>) -> anyhow::Result<Arc<Self>> {
        Self::queued(
            Arc::new(UdpTransport::bind_server(port, multicast_group)?),
            QUEUE_SIZE,
        )
    }

    /// This server's own address.
    pub fn local_identifier(&self) -> &Identifier {
        self.transport.local_identifier()
    }

    /// The file descriptor that becomes readable when a message is waiting:
    /// the queue's eventfd in queued mode, or the transport's own fd in
    /// direct mode.
    pub fn poll_fd(&self) -> std::os::fd::RawFd {
        match &self.queue {
            Some(q) => q.fd(),
            None => self.transport.fd(),
        }
    }

    /// Sends `message` to `to`.
    pub fn send(&self, message: &RawMessage, to: &Identifier) -> Result<(), SendError> {
        self.transport.send(message, to)
    }

    /// Waits up to `timeout_ms` for a message matching `sigsel` (empty
    /// selector matches anything) and, if given, `from`.
    ///
    /// `timeout_ms` follows the crate-wide convention: `0` is immediate, a
    /// negative value waits forever, a positive value bounds the wait.
    pub fn receive(
        self: &Arc<Self>,
        timeout_ms: i64,
        sigsel: &[u32],
        from: Option<&Identifier>,
    ) -> Option<ReceivedMessage> {
        let (message, sender) = self.strategy.receive(timeout_ms, sigsel, from)?;
        Some(ReceivedMessage::new(message, sender, Arc::downgrade(self)))
    }

    /// Starts the ingress worker, if this server was built in queued mode.
    /// A direct-mode server has nothing to start; this only flips the
    /// running flag. Idempotent: calling `start` while already running is a
    /// no-op that returns `true`.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return true;
        }
        if let Some(queue) = self.queue.clone() {
            let transport = self.transport.clone();
            let running = self.running.clone();
            let handle = thread::spawn(move || ingress_loop(transport, queue, running));
            *self.worker.lock() = Some(handle);
        }
        true
    }

    /// Stops the ingress worker (if any) and clears the queue. Idempotent:
    /// calling `stop` on an already-stopped server is a no-op. Matches the
    /// original implementation's `GenericSimpleServer`, which has no worker
    /// thread at all — a direct-mode server's `stop` only flips the flag.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.worker.lock().take() {
            if let Err(e) = handle.join() {
                error!("ingress worker panicked: {e:?}");
            }
        }
        if let Some(queue) = &self.queue {
            queue.stop();
            queue.clear();
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
        self.transport.close();
    }
}

fn ingress_loop(transport: Arc<dyn Transport>, queue: Arc<ReceiveQueue>, running: Arc<AtomicBool>) {
    let poll_timeout = ReceiveTimeout::Bounded(Duration::from_millis(INGRESS_POLL_TIMEOUT_MS));
    while running.load(Ordering::SeqCst) {
        let Some((message, from)) = transport.receive(poll_timeout) else {
            continue;
        };
        if reply_to_ping(transport.as_ref(), &message, &from) {
            continue;
        }
        if message.req_id() == PING_RSP {
            debug!("dropping stray pong from {from}");
            continue;
        }
        if let Err(e) = queue.add(message, from.clone()) {
            warn!("dropping message from {from}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PING_REQ;
    use std::time::Duration as StdDuration;

    fn unique_name(prefix: &str) -> String {
        format!("{prefix}-{}", uuid::Uuid::new_v4())
    }

    #[test]
    fn direct_server_stop_is_a_pure_flag_flip() {
        let server = Server::unix_direct(unique_name("linkwire-srv-direct")).unwrap();
        assert!(server.start());
        server.stop();
        server.stop(); // idempotent
    }

    #[test]
    fn queued_server_answers_ping_inline_without_enqueueing_it() {
        let server_name = unique_name("linkwire-srv-ping");
        let server = Server::unix_queued(&server_name).unwrap();
        server.start();

        let client_name = unique_name("linkwire-client-ping");
        let client_transport = UnixDatagramTransport::bind(&client_name).unwrap();
        client_transport
            .send(&RawMessage::new(PING_REQ), &Identifier::path(server_name))
            .unwrap();

        let (pong, _) = client_transport
            .receive(ReceiveTimeout::Bounded(StdDuration::from_millis(500)))
            .expect("expected a pong");
        assert_eq!(pong.req_id(), PING_RSP);
        assert!(server.receive(0, &[], None).is_none());

        server.stop();
    }

    #[test]
    fn queued_server_delivers_non_ping_messages() {
        let server_name = unique_name("linkwire-srv-echo");
        let server = Server::unix_queued(&server_name).unwrap();
        server.start();

        let client_name = unique_name("linkwire-client-echo");
        let client_transport = UnixDatagramTransport::bind(&client_name).unwrap();
        client_transport
            .send(
                &RawMessage::from_slice(1, b"hi"),
                &Identifier::path(server_name),
            )
            .unwrap();

        std::thread::sleep(StdDuration::from_millis(50));
        let envelope = server.receive(200, &[], None).expect("expected a message");
        assert_eq!(envelope.message().req_id(), 1);
        assert_eq!(envelope.from(), &Identifier::path(client_name));

        server.stop();
    }
}
