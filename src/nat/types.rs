//! Common types for the NAT module

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Transport protocol of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransportKind {
    /// TCP transport
    Tcp,
    /// UDP transport
    Udp,
}

impl TransportKind {
    /// URI scheme used in the textual form
    pub fn scheme(&self) -> &'static str {
        match self {
            TransportKind::Tcp => "tcp",
            TransportKind::Udp => "udp",
        }
    }

    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "tcp" => Some(TransportKind::Tcp),
            "udp" => Some(TransportKind::Udp),
            _ => None,
        }
    }
}

/// A network endpoint: transport kind, host and port
///
/// The textual form is `<kind>://<ip>:<port>`, with IPv6 hosts bracketed.
/// It is also the serialized form.
///
/// # Example
///
/// ```
/// use natlearn::nat::{TransportAddress, TransportKind};
///
/// let ta: TransportAddress = "udp://203.0.113.7:4500".parse().unwrap();
/// assert_eq!(ta.kind, TransportKind::Udp);
/// assert_eq!(ta.port, 4500);
/// assert_eq!(ta.to_string(), "udp://203.0.113.7:4500");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransportAddress {
    /// Transport protocol
    pub kind: TransportKind,
    /// Host IP address
    pub host: IpAddr,
    /// Port number
    pub port: u16,
}

impl TransportAddress {
    /// Create a new transport address
    pub fn new(kind: TransportKind, host: IpAddr, port: u16) -> Self {
        Self { kind, host, port }
    }

    /// The IP address part, used to group observations by external IP
    pub fn ip(&self) -> IpAddr {
        self.host
    }

    /// Same kind and host at a different port
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            kind: self.kind,
            host: self.host,
            port,
        }
    }

    /// Host and port as a socket address
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl fmt::Display for TransportAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.kind.scheme(), self.socket_addr())
    }
}

impl FromStr for TransportAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| Error::InvalidAddress(format!("missing scheme in {:?}", s)))?;

        let kind = TransportKind::from_scheme(scheme)
            .ok_or_else(|| Error::InvalidAddress(format!("unknown transport {:?}", scheme)))?;

        let sock: SocketAddr = rest
            .parse()
            .map_err(|e| Error::InvalidAddress(format!("{:?}: {}", s, e)))?;

        Ok(Self::new(kind, sock.ip(), sock.port()))
    }
}

impl TryFrom<String> for TransportAddress {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TransportAddress> for String {
    fn from(ta: TransportAddress) -> Self {
        ta.to_string()
    }
}
