//! Unix-domain datagram transport, bound to the Linux abstract namespace (no
//! filesystem entry, no cleanup-on-exit concerns).

use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::os::linux::net::SocketAddrExt;
use std::os::unix::net::{SocketAddr, UnixDatagram};

use tracing::{debug, error, warn};

use crate::defaults::MAX_MESSAGE_SIZE;
use crate::error::SendError;
use crate::identifier::Identifier;
use crate::message::RawMessage;

use super::{ReceiveTimeout, Transport};

/// A datagram socket bound to an abstract-namespace Unix-domain address.
pub struct UnixDatagramTransport {
    socket: UnixDatagram,
    local: Identifier,
}

impl UnixDatagramTransport {
    /// Opens a socket and binds it to the abstract name `name`.
    pub fn bind(name: impl Into<String>) -> anyhow::Result<Self> {
        let name = name.into();
        let addr = SocketAddr::from_abstract_name(name.as_bytes())?;
        let socket = UnixDatagram::bind_addr(&addr)?;
        Ok(Self {
            socket,
            local: Identifier::path(name),
        })
    }

    fn address_name(addr: &SocketAddr) -> String {
        addr.as_abstract_name()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }
}

impl Transport for UnixDatagramTransport {
    fn local_identifier(&self) -> &Identifier {
        &self.local
    }

    fn fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }

    fn send(&self, message: &RawMessage, to: &Identifier) -> Result<(), SendError> {
        let Identifier::Path(name) = to else {
            return Err(SendError::InvalidAddress(format!(
                "{to} is not a Unix-domain path identifier"
            )));
        };
        let dest = SocketAddr::from_abstract_name(name.as_bytes())
            .map_err(|e| SendError::InvalidAddress(e.to_string()))?;
        if message.size() > MAX_MESSAGE_SIZE {
            return Err(SendError::TooLarge { size: message.size() });
        }
        let bytes = message.to_bytes();
        let sent = self.socket.send_to_addr(&bytes, &dest)?;
        if sent != bytes.len() {
            return Err(SendError::ShortWrite {
                sent,
                expected: bytes.len(),
            });
        }
        Ok(())
    }

    fn receive(&self, timeout: ReceiveTimeout) -> Option<(RawMessage, Identifier)> {
        let bytes_available = poll_and_check_size(self.fd(), timeout)?;
        if bytes_available == 0 {
            return None;
        }
        let mut buf = vec![0u8; bytes_available];
        match self.socket.recv_from(&mut buf) {
            Ok((len, addr)) => {
                if len != buf.len() {
                    warn!("unix datagram receive got wrong size: {len} != {bytes_available}");
                    return None;
                }
                let from = Identifier::path(Self::address_name(&addr));
                match RawMessage::deserialize(buf) {
                    Some(msg) => Some((msg, from)),
                    None => {
                        debug!("dropped truncated unix datagram frame from {from}");
                        None
                    }
                }
            }
            Err(e) if is_closed(&e) => None,
            Err(e) => {
                error!("unix datagram receive failed: {e}");
                None
            }
        }
    }

    fn flush(&self) -> usize {
        match bytes_available(self.fd()) {
            Some(n) if n > 0 => {
                let mut buf = vec![0u8; n];
                let _ = self.socket.recv_from(&mut buf);
                n
            }
            _ => 0,
        }
    }

    fn close(&self) {
        let _ = self.socket.shutdown(std::net::Shutdown::Both);
    }
}

fn is_closed(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::EBADF)
}

/// Polls `fd` for readability within `timeout`, then returns the exact
/// number of bytes the next datagram occupies (via `ioctl(FIONREAD)`), or
/// `None` on timeout / poll failure.
pub(super) fn poll_and_check_size(fd: RawFd, timeout: ReceiveTimeout) -> Option<usize> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let rc = unsafe { libc::poll(&mut pfd, 1, timeout.poll_millis()) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        if !is_closed(&err) {
            error!("poll failed: {err}");
        }
        return None;
    }
    if rc == 0 {
        return None;
    }
    bytes_available(fd)
}

pub(super) fn bytes_available(fd: RawFd) -> Option<usize> {
    let mut available: libc::c_int = 0;
    let rc = unsafe { libc::ioctl(fd, libc::FIONREAD, &mut available) };
    if rc < 0 {
        error!("ioctl(FIONREAD) failed: {}", io::Error::last_os_error());
        return None;
    }
    Some(available.max(0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn send_and_receive_round_trip_over_abstract_socket() {
        let name_a = format!("linkwire-test-a-{}", uuid::Uuid::new_v4());
        let name_b = format!("linkwire-test-b-{}", uuid::Uuid::new_v4());
        let a = UnixDatagramTransport::bind(&name_a).unwrap();
        let b = UnixDatagramTransport::bind(&name_b).unwrap();

        let msg = RawMessage::from_slice(7, b"hello");
        a.send(&msg, &Identifier::path(name_b.clone())).unwrap();

        let (received, from) = b
            .receive(ReceiveTimeout::Bounded(Duration::from_millis(500)))
            .expect("expected a message");
        assert_eq!(received.req_id(), 7);
        assert_eq!(received.payload(), b"hello");
        assert_eq!(from, Identifier::path(name_a));
    }

    #[test]
    fn receive_times_out_when_nothing_arrives() {
        let name = format!("linkwire-test-empty-{}", uuid::Uuid::new_v4());
        let t = UnixDatagramTransport::bind(&name).unwrap();
        assert!(t
            .receive(ReceiveTimeout::Bounded(Duration::from_millis(50)))
            .is_none());
    }

    #[test]
    fn send_to_non_path_identifier_is_rejected() {
        let name = format!("linkwire-test-reject-{}", uuid::Uuid::new_v4());
        let t = UnixDatagramTransport::bind(&name).unwrap();
        let result = t.send(&RawMessage::new(1), &Identifier::port("127.0.0.1", 9000));
        assert!(matches!(result, Err(SendError::InvalidAddress(_))));
    }

    #[test]
    fn send_rejects_a_message_over_the_datagram_limit() {
        let name = format!("linkwire-test-toolarge-{}", uuid::Uuid::new_v4());
        let t = UnixDatagramTransport::bind(&name).unwrap();
        let oversized = RawMessage::from_vec(1, vec![0u8; MAX_MESSAGE_SIZE]);
        let result = t.send(&oversized, &Identifier::path(name));
        assert!(matches!(result, Err(SendError::TooLarge { .. })));
    }
}
