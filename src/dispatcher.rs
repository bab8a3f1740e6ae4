//! A request-id routed callback dispatcher built on top of a
//! [`crate::server::Server`]: register a handler per request id, then pump
//! [`Dispatcher::handle_message`] in a loop instead of matching on envelopes
//! by hand.

use std::collections::HashMap;
use std::os::fd::RawFd;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::envelope::ReceivedMessage;
use crate::error::SendError;
use crate::identifier::Identifier;
use crate::message::RawMessage;
use crate::server::Server;

/// A callback invoked with the envelope for a matched request id. Returns an
/// application-defined status code, passed back unchanged from
/// [`Dispatcher::handle_message`].
pub type Callback = Arc<dyn Fn(&ReceivedMessage) -> i32 + Send + Sync>;

/// Routes incoming messages to a callback registered by request id.
pub struct Dispatcher {
    server: Arc<Server>,
    handlers: Mutex<HashMap<u32, Callback>>,
}

impl Dispatcher {
    /// Wraps `server` with an empty handler table.
    pub fn new(server: Arc<Server>) -> Arc<Self> {
        Arc::new(Self {
            server,
            handlers: Mutex::new(HashMap::new()),
        })
    }

    /// Registers `callback` to run for messages carrying `req_id`. A
    /// second registration for the same id replaces the first.
    pub fn register(
        &self,
        req_id: u32,
        callback: impl Fn(&ReceivedMessage) -> i32 + Send + Sync + 'static,
    ) {
        self.handlers.lock().insert(req_id, Arc::new(callback));
    }

    /// Starts the underlying server's ingress worker.
    pub fn start(self: &Arc<Self>) -> bool {
        self.server.start()
    }

    /// Stops the underlying server's ingress worker.
    pub fn stop(&self) {
        self.server.stop()
    }

    /// Sends `message` to `to` through the underlying server.
    pub fn send(&self, message: &RawMessage, to: &Identifier) -> Result<(), SendError> {
        self.server.send(message, to)
    }

    /// The underlying server's poll fd.
    pub fn poll_fd(&self) -> RawFd {
        self.server.poll_fd()
    }

    /// Waits up to `timeout_ms` for one message and dispatches it to its
    /// registered handler.
    ///
    /// Returns `-1` if no message arrived within the timeout, the
    /// handler's own return value if one was registered for the message's
    /// request id, or `0` if no handler was registered (logged at
    /// `debug!`, matching the original implementation's "no handler"
    /// path — not an error, just routine).
    pub fn handle_message(self: &Arc<Self>, timeout_ms: i64) -> i32 {
        let Some(envelope) = self.server.receive(timeout_ms, &[], None) else {
            return -1;
        };
        let req_id = envelope.message().req_id();
        // Clone the Arc and drop the lock before invoking: the callback may
        // itself call back into the dispatcher (e.g. to register further
        // handlers or send a response).
        let callback = self.handlers.lock().get(&req_id).cloned();
        match callback {
            Some(cb) => cb(&envelope),
            None => {
                debug!("no handler registered for request id {req_id:#x}");
                0
            }
        }
    }
}
