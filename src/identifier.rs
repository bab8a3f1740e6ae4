//! Peer identifiers: either a named Unix-domain abstract-namespace path, or
//! an ip:port pair (used for both UDP unicast and multicast/broadcast).
//!
//! Equality is closed over the variant: a `Path` is never equal to a `Port`,
//! even if their string forms happen to collide. `Port` equality is
//! restricted-ip aware — if either side is flagged `restricted` (its ip is a
//! multicast or broadcast address), only the port is compared, since a
//! client that sent to a group address cannot know which member's ip a
//! reply will arrive from.

use std::fmt;
use std::net::Ipv4Addr;

/// The address of an IPC peer.
#[derive(Debug, Clone)]
pub enum Identifier {
    /// A Unix-domain abstract-namespace socket name.
    Path(String),
    /// An ip:port pair, as used by the UDP transport.
    Port {
        /// Dotted-quad IPv4 address.
        ip: String,
        /// UDP port.
        port: u16,
        /// Set when `ip` is a multicast or broadcast address; narrows
        /// equality to the port alone.
        restricted: bool,
    },
}

impl Identifier {
    /// Builds a Unix-domain identifier.
    pub fn path(name: impl Into<String>) -> Self {
        Self::Path(name.into())
    }

    /// Builds a UDP identifier, automatically classifying `ip` as
    /// restricted if it is multicast or broadcast.
    pub fn port(ip: impl Into<String>, port: u16) -> Self {
        let ip = ip.into();
        let restricted = is_multicast_ip(&ip) || is_broadcast_ip(&ip);
        Self::Port { ip, port, restricted }
    }

    /// A human-readable rendering of this identifier (`path` or `ip:port`).
    pub fn format(&self) -> String {
        match self {
            Self::Path(p) => p.clone(),
            Self::Port { ip, port, .. } => format!("{ip}:{port}"),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Path(a), Self::Path(b)) => a == b,
            (
                Self::Port { ip: ip_a, port: port_a, restricted: r_a },
                Self::Port { ip: ip_b, port: port_b, restricted: r_b },
            ) => {
                if *r_a || *r_b {
                    port_a == port_b
                } else {
                    ip_a == ip_b && port_a == port_b
                }
            }
            _ => false,
        }
    }
}

impl Eq for Identifier {}

/// Classifies `ip` (dotted-quad IPv4) as a multicast address (224.0.0.0/4).
pub fn is_multicast_ip(ip: &str) -> bool {
    ip.parse::<Ipv4Addr>()
        .map(|addr| addr.is_multicast())
        .unwrap_or(false)
}

/// Classifies `ip` (dotted-quad IPv4) as the limited broadcast address.
pub fn is_broadcast_ip(ip: &str) -> bool {
    ip.parse::<Ipv4Addr>()
        .map(|addr| addr.is_broadcast())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_compare_by_string_equality() {
        assert_eq!(Identifier::path("svc"), Identifier::path("svc"));
        assert_ne!(Identifier::path("svc"), Identifier::path("other"));
    }

    #[test]
    fn ports_compare_ip_and_port_when_unrestricted() {
        let a = Identifier::port("10.0.0.1", 9000);
        let b = Identifier::port("10.0.0.2", 9000);
        assert_ne!(a, b);
        assert_eq!(a, Identifier::port("10.0.0.1", 9000));
    }

    #[test]
    fn multicast_ports_compare_by_port_only() {
        let a = Identifier::port("239.1.1.1", 9000);
        let b = Identifier::port("239.1.1.2", 9000);
        assert!(matches!(a, Identifier::Port { restricted: true, .. }));
        assert_eq!(a, b);
    }

    #[test]
    fn path_and_port_are_never_equal() {
        assert_ne!(Identifier::path("9000"), Identifier::port("0.0.0.0", 9000));
    }

    #[test]
    fn classifies_broadcast_and_multicast() {
        assert!(is_broadcast_ip("255.255.255.255"));
        assert!(is_multicast_ip("239.255.0.1"));
        assert!(!is_multicast_ip("10.0.0.1"));
    }
}
