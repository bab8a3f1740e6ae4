//! UDP datagram transport, including multicast and broadcast peers.

use std::net::{Ipv4Addr, UdpSocket};
use std::os::fd::{AsRawFd, RawFd};
use std::str::FromStr;

use tracing::{debug, error, warn};

use crate::defaults::MAX_MESSAGE_SIZE;
use crate::error::SendError;
use crate::identifier::{is_broadcast_ip, is_multicast_ip, Identifier};
use crate::message::RawMessage;

use super::unix_datagram::{bytes_available, poll_and_check_size};
use super::{ReceiveTimeout, Transport};

/// The multicast group a hunted UDP server joins by default, mirroring the
/// original implementation's fixed multicast address.
pub const DEFAULT_MULTICAST_GROUP: &str = "239.0.0.1";

/// A UDP socket, optionally joined to a multicast group or enabled for
/// broadcast sends.
pub struct UdpTransport {
    socket: UdpSocket,
    local: Identifier,
}

impl UdpTransport {
    /// Binds to `port` on all interfaces. If `multicast_group` is given,
    /// joins that group so datagrams sent to it are also delivered here.
    pub fn bind_server(port: u16, multicast_group: Option<&str>) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port))?;
        let ip = if let Some(group) = multicast_group {
            let group_addr = Ipv4Addr::from_str(group)?;
            socket.join_multicast_v4(&group_addr, &Ipv4Addr::UNSPECIFIED)?;
            group.to_string()
        } else {
            "0.0.0.0".to_string()
        };
        Ok(Self {
            socket,
            local: Identifier::port(ip, port),
        })
    }

    /// Opens an ephemeral client socket. If `target_ip` is a multicast or
    /// broadcast address, configures the socket accordingly before any send.
    pub fn bind_client(target_ip: &str) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        if is_multicast_ip(target_ip) {
            socket.set_multicast_ttl_v4(1)?;
            socket.set_multicast_loop_v4(true)?;
        } else if is_broadcast_ip(target_ip) {
            socket.set_broadcast(true)?;
        }
        let local_addr = socket.local_addr()?;
        Ok(Self {
            socket,
            local: Identifier::port(local_addr.ip().to_string(), local_addr.port()),
        })
    }
}

impl Transport for UdpTransport {
    fn local_identifier(&self) -> &Identifier {
        &self.local
    }

    fn fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }

    fn send(&self, message: &RawMessage, to: &Identifier) -> Result<(), SendError> {
        let Identifier::Port { ip, port, .. } = to else {
            return Err(SendError::InvalidAddress(format!(
                "{to} is not a UDP port identifier"
            )));
        };
        let addr: std::net::SocketAddrV4 = format!("{ip}:{port}")
            .parse()
            .map_err(|_| SendError::InvalidAddress(format!("invalid IP address: {ip}")))?;
        if message.size() > MAX_MESSAGE_SIZE {
            return Err(SendError::TooLarge { size: message.size() });
        }
        let bytes = message.to_bytes();
        let sent = self.socket.send_to(&bytes, addr)?;
        if sent != bytes.len() {
            return Err(SendError::ShortWrite {
                sent,
                expected: bytes.len(),
            });
        }
        Ok(())
    }

    fn receive(&self, timeout: ReceiveTimeout) -> Option<(RawMessage, Identifier)> {
        let bytes_avail = poll_and_check_size(self.fd(), timeout)?;
        if bytes_avail == 0 {
            return None;
        }
        let mut buf = vec![0u8; bytes_avail];
        match self.socket.recv_from(&mut buf) {
            Ok((len, addr)) => {
                if len != buf.len() {
                    warn!("udp receive got wrong size: {len} != {bytes_avail}");
                    return None;
                }
                let from = Identifier::port(addr.ip().to_string(), addr.port());
                match RawMessage::deserialize(buf) {
                    Some(msg) => Some((msg, from)),
                    None => {
                        debug!("dropped truncated udp frame from {from}");
                        None
                    }
                }
            }
            Err(e) if e.raw_os_error() == Some(libc::EBADF) => None,
            Err(e) => {
                error!("udp receive failed: {e}");
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
        // UDP sockets have no notion of shutdown; dropping the socket is
        // the only way to release the fd. Kept as a no-op for symmetry
        // with UnixDatagramTransport::close.
    }
}
