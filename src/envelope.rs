//! The envelope handed back from a successful receive: the message itself,
//! who it came from, and a weak handle back to the server it arrived on so
//! a reply can be sent without the envelope keeping the server alive.

use std::sync::Weak;

use crate::error::SendError;
use crate::identifier::Identifier;
use crate::message::RawMessage;
use crate::server::Server;

/// A message received on a [`Server`], together with its sender and a way
/// to reply.
///
/// Holds only a [`Weak`] reference to the server it arrived on — if the
/// server has since been dropped, [`ReceivedMessage::send_response`] fails
/// with [`SendError::ServerGone`] instead of keeping the server alive or
/// invoking undefined behavior.
pub struct ReceivedMessage {
    message: RawMessage,
    from: Identifier,
    server: Weak<Server>,
}

impl ReceivedMessage {
    /// Builds an envelope for `message`, received from `from` on `server`.
    pub fn new(message: RawMessage, from: Identifier, server: Weak<Server>) -> Self {
        Self {
            message,
            from,
            server,
        }
    }

    /// The received message.
    pub fn message(&self) -> &RawMessage {
        &self.message
    }

    /// Consumes the envelope, returning the message.
    pub fn into_message(self) -> RawMessage {
        self.message
    }

    /// The identifier of the peer that sent this message.
    pub fn from(&self) -> &Identifier {
        &self.from
    }

    /// Sends `response` back to [`ReceivedMessage::from`] via the server
    /// this message arrived on.
    pub fn send_response(&self, response: &RawMessage) -> Result<(), SendError> {
        let server = self.server.upgrade().ok_or(SendError::ServerGone)?;
        server.send(response, &self.from)
    }
}
