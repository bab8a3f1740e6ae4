//! The wire-level message: a 32-bit request id plus an opaque payload.
//!
//! On the wire a message is `req_id` (4 bytes, big-endian) followed
//! immediately by the payload; there is no length field, because the
//! surrounding datagram already carries its own boundary.

/// A framed IPC message: an application-defined request id plus an opaque,
/// byte-order-agnostic payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    req_id: u32,
    payload: Vec<u8>,
}

impl RawMessage {
    /// Builds a message with an empty payload.
    pub fn new(req_id: u32) -> Self {
        Self {
            req_id,
            payload: Vec::new(),
        }
    }

    /// Builds a message with `capacity` bytes reserved for the payload.
    pub fn with_capacity(req_id: u32, capacity: usize) -> Self {
        Self {
            req_id,
            payload: Vec::with_capacity(capacity),
        }
    }

    /// Builds a message by copying `payload`.
    pub fn from_slice(req_id: u32, payload: &[u8]) -> Self {
        Self {
            req_id,
            payload: payload.to_vec(),
        }
    }

    /// Builds a message, taking ownership of `payload` without copying it.
    pub fn from_vec(req_id: u32, payload: Vec<u8>) -> Self {
        Self { req_id, payload }
    }

    /// The request id this message carries.
    pub fn req_id(&self) -> u32 {
        self.req_id
    }

    /// The message's payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consumes the message, returning its payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Total size on the wire: the 4-byte header plus the payload.
    pub fn size(&self) -> usize {
        4 + self.payload.len()
    }

    /// Serializes this message into `buf`.
    ///
    /// Returns `0` if `buf` is smaller than [`RawMessage::size`] (matching
    /// the original C++ contract), otherwise returns the number of bytes
    /// written (equal to `size()`).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        let total = self.size();
        if buf.len() < total {
            return 0;
        }
        buf[..4].copy_from_slice(&self.req_id.to_be_bytes());
        buf[4..total].copy_from_slice(&self.payload);
        total
    }

    /// Serializes this message into a freshly allocated buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.size()];
        self.serialize(&mut buf);
        buf
    }

    /// Deserializes a message from a received datagram, taking ownership of
    /// the payload bytes without copying them.
    ///
    /// Returns `None` if `buffer` is shorter than the 4-byte request-id
    /// header — the caller should treat this the same as "nothing arrived".
    pub fn deserialize(mut buffer: Vec<u8>) -> Option<Self> {
        if buffer.len() < 4 {
            return None;
        }
        let req_id = u32::from_be_bytes(buffer[..4].try_into().unwrap());
        buffer.drain(..4);
        Some(Self {
            req_id,
            payload: buffer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_serialize_and_deserialize() {
        let msg = RawMessage::from_slice(42, b"hello");
        let bytes = msg.to_bytes();
        let decoded = RawMessage::deserialize(bytes).unwrap();
        assert_eq!(decoded.req_id(), 42);
        assert_eq!(decoded.payload(), b"hello");
    }

    #[test]
    fn serialize_reports_zero_when_buffer_too_small() {
        let msg = RawMessage::from_slice(1, b"0123456789");
        let mut small = [0u8; 4];
        assert_eq!(msg.serialize(&mut small), 0);
    }

    #[test]
    fn deserialize_rejects_truncated_header() {
        assert!(RawMessage::deserialize(vec![0, 1, 2]).is_none());
    }

    #[test]
    fn deserialize_accepts_empty_payload() {
        let msg = RawMessage::new(7);
        let decoded = RawMessage::deserialize(msg.to_bytes()).unwrap();
        assert_eq!(decoded.req_id(), 7);
        assert!(decoded.payload().is_empty());
    }

    #[test]
    fn size_accounts_for_header() {
        let msg = RawMessage::from_slice(1, b"abc");
        assert_eq!(msg.size(), 7);
    }
}
