//! A bounded, FIFO receive queue shared between an ingress worker and
//! receivers blocked in [`ReceiveQueue::get`].
//!
//! Mirrors the original implementation's mutex+condvar queue paired with an
//! `eventfd`, so the queue's readiness can be polled alongside a socket fd
//! by anyone who wants to multiplex instead of blocking.

use std::collections::VecDeque;
use std::os::fd::RawFd;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::QueueError;
use crate::event_signal::EventSignal;
use crate::identifier::Identifier;
use crate::message::RawMessage;

/// A message paired with the identifier of the peer it arrived from.
pub struct QueuedMessage {
    /// The message itself.
    pub message: RawMessage,
    /// The peer that sent it.
    pub from: Identifier,
}

struct Inner {
    items: VecDeque<QueuedMessage>,
    stopped: bool,
}

/// A bounded FIFO of [`QueuedMessage`]s with selector-aware, out-of-order
/// retrieval: [`ReceiveQueue::get`] scans from the front and removes the
/// first entry matching the caller's request-id selector and optional
/// sender filter, leaving everything else in place.
pub struct ReceiveQueue {
    capacity: usize,
    inner: Mutex<Inner>,
    not_empty: Condvar,
    signal: EventSignal,
}

impl ReceiveQueue {
    /// Creates a new queue bounded at `capacity` entries.
    pub fn new(capacity: usize) -> std::io::Result<Self> {
        Ok(Self {
            capacity,
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                stopped: false,
            }),
            not_empty: Condvar::new(),
            signal: EventSignal::new()?,
        })
    }

    /// The file descriptor that becomes readable whenever the queue is
    /// non-empty.
    pub fn fd(&self) -> RawFd {
        self.signal.fd()
    }

    /// Appends a message, or returns [`QueueError::Full`] if the queue is at
    /// capacity, or [`QueueError::Stopped`] if [`ReceiveQueue::stop`] has
    /// been called.
    pub fn add(&self, message: RawMessage, from: Identifier) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        if inner.stopped {
            return Err(QueueError::Stopped);
        }
        if inner.items.len() >= self.capacity {
            return Err(QueueError::Full);
        }
        inner.items.push_back(QueuedMessage { message, from });
        let _ = self.signal.write_event();
        self.not_empty.notify_all();
        Ok(())
    }

    /// Retrieves the first message matching `sigsel` (an empty selector
    /// matches any request id) and, if given, `from`.
    ///
    /// `timeout_ms` follows the same convention as the rest of the crate:
    /// `0` returns immediately, a negative value waits forever, and a
    /// positive value bounds the wait.
    pub fn get(
        &self,
        timeout_ms: i64,
        sigsel: &[u32],
        from: Option<&Identifier>,
    ) -> Option<QueuedMessage> {
        let mut inner = self.inner.lock();

        if timeout_ms == 0 {
            return Self::take_match(&mut inner, sigsel, from, &self.signal);
        }

        if timeout_ms < 0 {
            loop {
                if let Some(found) = Self::take_match(&mut inner, sigsel, from, &self.signal) {
                    return Some(found);
                }
                if inner.stopped {
                    return None;
                }
                self.not_empty.wait(&mut inner);
            }
        }

        let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);
        loop {
            if let Some(found) = Self::take_match(&mut inner, sigsel, from, &self.signal) {
                return Some(found);
            }
            if inner.stopped {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let timed_out = self
                .not_empty
                .wait_for(&mut inner, deadline - now)
                .timed_out();
            if timed_out {
                return Self::take_match(&mut inner, sigsel, from, &self.signal);
            }
        }
    }

    fn take_match(
        inner: &mut Inner,
        sigsel: &[u32],
        from: Option<&Identifier>,
        signal: &EventSignal,
    ) -> Option<QueuedMessage> {
        let index = inner.items.iter().position(|entry| {
            let req_matches = sigsel.is_empty() || sigsel.contains(&entry.message.req_id());
            let from_matches = from.map_or(true, |want| *want == entry.from);
            req_matches && from_matches
        })?;
        let found = inner.items.remove(index);
        let _ = signal.read_event();
        found
    }

    /// Discards all queued messages.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.items.clear();
        self.signal.clear_events();
    }

    /// Marks the queue stopped: further `add` calls fail, and any blocked
    /// `get` wakes and returns `None`.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        inner.stopped = true;
        self.not_empty.notify_all();
    }

    /// The number of messages currently queued.
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// `true` if no messages are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(req_id: u32) -> RawMessage {
        RawMessage::new(req_id)
    }

    fn from() -> Identifier {
        Identifier::path("peer")
    }

    #[test]
    fn add_then_immediate_get_round_trips() {
        let q = ReceiveQueue::new(4).unwrap();
        q.add(msg(1), from()).unwrap();
        let got = q.get(0, &[], None).unwrap();
        assert_eq!(got.message.req_id(), 1);
        assert!(q.is_empty());
    }

    #[test]
    fn immediate_get_on_empty_queue_returns_none() {
        let q = ReceiveQueue::new(4).unwrap();
        assert!(q.get(0, &[], None).is_none());
    }

    #[test]
    fn selector_skips_non_matching_front_entry() {
        let q = ReceiveQueue::new(4).unwrap();
        q.add(msg(1), from()).unwrap();
        q.add(msg(2), from()).unwrap();
        let got = q.get(0, &[2], None).unwrap();
        assert_eq!(got.message.req_id(), 2);
        // req 1 is still queued, untouched.
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn add_fails_when_queue_is_full() {
        let q = ReceiveQueue::new(1).unwrap();
        q.add(msg(1), from()).unwrap();
        assert!(matches!(q.add(msg(2), from()), Err(QueueError::Full)));
    }

    #[test]
    fn stop_wakes_blocked_getter() {
        use std::sync::Arc;
        use std::thread;

        let q = Arc::new(ReceiveQueue::new(4).unwrap());
        let q2 = q.clone();
        let handle = thread::spawn(move || q2.get(-1, &[], None));
        thread::sleep(Duration::from_millis(50));
        q.stop();
        assert!(handle.join().unwrap().is_none());
    }

    #[test]
    fn add_after_stop_is_rejected() {
        let q = ReceiveQueue::new(4).unwrap();
        q.stop();
        assert!(matches!(q.add(msg(1), from()), Err(QueueError::Stopped)));
    }
}
