//! The two ways a [`crate::server::Server`] can satisfy a `receive` call:
//! read the transport directly, or pull from a background-populated
//! [`crate::queue::ReceiveQueue`]. Both implement the same contract so the
//! rest of the server doesn't need to know which one it was built with.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::identifier::Identifier;
use crate::message::RawMessage;
use crate::queue::ReceiveQueue;
use crate::transport::{reply_to_ping, ReceiveTimeout, Transport};
use crate::PING_RSP;

/// Satisfies a single `receive(timeout, sigsel, from)` call.
pub trait ReceiveStrategy: Send + Sync {
    /// Waits up to `timeout_ms` for a message matching `sigsel` (empty
    /// selector matches anything) and, if given, `from`.
    fn receive(
        &self,
        timeout_ms: i64,
        sigsel: &[u32],
        from: Option<&Identifier>,
    ) -> Option<(RawMessage, Identifier)>;
}

/// Reads the transport directly, with no background worker and no queue.
///
/// Matches the original implementation's no-thread endpoint, generalized so
/// a direct-mode server can still be hunted: a hunt ping arriving here is
/// answered inline before anything else runs, a stray pong the caller isn't
/// explicitly selecting on is swallowed, and a message matching neither the
/// selector nor `from` is discarded and the read retried until the deadline
/// elapses.
pub struct DirectStrategy {
    transport: Arc<dyn Transport>,
}

impl DirectStrategy {
    /// Wraps `transport` for direct (unthreaded) receiving.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl ReceiveStrategy for DirectStrategy {
    fn receive(
        &self,
        timeout_ms: i64,
        sigsel: &[u32],
        from: Option<&Identifier>,
    ) -> Option<(RawMessage, Identifier)> {
        enum Deadline {
            Immediate,
            Bounded(Instant),
            Infinite,
        }

        let deadline = match timeout_ms {
            0 => Deadline::Immediate,
            t if t < 0 => Deadline::Infinite,
            t => Deadline::Bounded(Instant::now() + Duration::from_millis(t as u64)),
        };

        loop {
            let wait = match deadline {
                Deadline::Immediate => ReceiveTimeout::Immediate,
                Deadline::Infinite => ReceiveTimeout::Infinite,
                Deadline::Bounded(dl) => {
                    let now = Instant::now();
                    if now >= dl {
                        return None;
                    }
                    ReceiveTimeout::Bounded(dl - now)
                }
            };

            let Some((message, sender)) = self.transport.receive(wait) else {
                match deadline {
                    Deadline::Immediate => return None,
                    Deadline::Infinite => continue,
                    Deadline::Bounded(dl) => {
                        if Instant::now() >= dl {
                            return None;
                        }
                        continue;
                    }
                }
            };

            if reply_to_ping(self.transport.as_ref(), &message, &sender) {
                continue;
            }
            if message.req_id() == PING_RSP && !sigsel.contains(&PING_RSP) {
                continue;
            }

            let req_matches = sigsel.is_empty() || sigsel.contains(&message.req_id());
            let from_matches = from.map_or(true, |want| *want == sender);
            if req_matches && from_matches {
                return Some((message, sender));
            }
            if matches!(deadline, Deadline::Immediate) {
                return None;
            }
        }
    }
}

/// Pulls from a [`ReceiveQueue`] populated by a background ingress worker.
pub struct QueuedStrategy {
    queue: Arc<ReceiveQueue>,
}

impl QueuedStrategy {
    /// Wraps `queue` for queued receiving.
    pub fn new(queue: Arc<ReceiveQueue>) -> Self {
        Self { queue }
    }
}

impl ReceiveStrategy for QueuedStrategy {
    fn receive(
        &self,
        timeout_ms: i64,
        sigsel: &[u32],
        from: Option<&Identifier>,
    ) -> Option<(RawMessage, Identifier)> {
        self.queue
            .get(timeout_ms, sigsel, from)
            .map(|entry| (entry.message, entry.from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::unix_datagram::UnixDatagramTransport;
    use crate::PING_REQ;

    fn unique_name(prefix: &str) -> String {
        format!("{prefix}-{}", uuid::Uuid::new_v4())
    }

    #[test]
    fn direct_strategy_answers_a_ping_without_returning_it() {
        let server_name = unique_name("linkwire-direct-ping-srv");
        let server_transport = Arc::new(UnixDatagramTransport::bind(&server_name).unwrap());
        let strategy = DirectStrategy::new(server_transport);

        let client_name = unique_name("linkwire-direct-ping-client");
        let client_transport = UnixDatagramTransport::bind(&client_name).unwrap();
        client_transport
            .send(&RawMessage::new(PING_REQ), &Identifier::path(server_name))
            .unwrap();

        // The ping is answered and swallowed inline, never handed back to
        // the caller, and the call still returns promptly despite asking
        // for an unmatchable selector on an immediate receive.
        assert!(strategy.receive(0, &[], None).is_none());

        let (pong, _) = client_transport
            .receive(ReceiveTimeout::Bounded(Duration::from_millis(500)))
            .expect("expected a pong");
        assert_eq!(pong.req_id(), PING_RSP);
    }

    #[test]
    fn direct_strategy_retries_past_a_non_matching_message_until_the_deadline() {
        let server_name = unique_name("linkwire-direct-retry-srv");
        let server_transport = Arc::new(UnixDatagramTransport::bind(&server_name).unwrap());
        let strategy = DirectStrategy::new(server_transport);

        let client_name = unique_name("linkwire-direct-retry-client");
        let client_transport = UnixDatagramTransport::bind(&client_name).unwrap();
        let target = Identifier::path(server_name);
        client_transport.send(&RawMessage::new(1), &target).unwrap();
        client_transport.send(&RawMessage::new(2), &target).unwrap();

        let (message, _) = strategy
            .receive(500, &[2], None)
            .expect("should retry past req id 1 and find req id 2 before the deadline");
        assert_eq!(message.req_id(), 2);
    }
}
