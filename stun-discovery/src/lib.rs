//! NAT behavior discovery.
//!
//! This crate sequences STUN Binding requests against a server that implements
//! [`RFC 5780`](https://datatracker.ietf.org/doc/html/rfc5780) (or the `CHANGED-ADDRESS`
//! flavor of RFC 3489) and classifies the mapping and filtering behavior of the NATs
//! found on the path.
//!
//! The network is abstracted behind the [`Transport`] trait. [`UdpTransport`] and
//! [`TcpTransport`] are provided; [`StunClient`] correlates requests and responses on top
//! of any transport and [`NatClassifier`] drives the probes.
//!
//! ```no_run
//! use stun_discovery::{NatClassifierBuilder, UdpTransport};
//!
//! # async fn run() -> Result<(), stun_discovery::DiscoveryError> {
//! let transport = UdpTransport::bind("0.0.0.0:0".parse().unwrap()).await?;
//! let mut classifier = NatClassifierBuilder::new("stun.example.org", transport).build();
//! let classification = classifier.check().await?;
//! println!("{}", classification.nat_type());
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

use log::debug;
use std::error;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use stun_proto::StunEncodeError;

mod behavior;
mod classifier;
mod client;
mod local;
mod transport;

pub use crate::behavior::{FilteringBehavior, MappingBehavior, NatType};
pub use crate::classifier::{
    NatClassification, NatClassifier, NatClassifierBuilder, Probe, ProbeOutcome, ProbeReport,
    DEFAULT_PORT, DEFAULT_TIMEOUT,
};
pub use crate::client::StunClient;
pub use crate::local::{InterfaceAddresses, LocalAddresses, StaticAddresses};
pub use crate::transport::{TcpTransport, Transport, UdpTransport};

/// Errors raised while discovering the NAT behavior
#[derive(Debug)]
pub enum DiscoveryError {
    /// Socket error
    Io(io::Error),
    /// The server name did not resolve to any address
    Resolution(String),
    /// The request could not be encoded
    Encode(StunEncodeError),
    /// No response arrived before the deadline
    Timeout,
    /// A response arrived but it is not the one expected
    UnexpectedResponse(String),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::Io(e) => write!(f, "I/O error: {}", e),
            DiscoveryError::Resolution(host) => write!(f, "Can not resolve {}", host),
            DiscoveryError::Encode(e) => write!(f, "Encode error: {}", e),
            DiscoveryError::Timeout => write!(f, "Timeout"),
            DiscoveryError::UnexpectedResponse(msg) => write!(f, "Unexpected response: {}", msg),
        }
    }
}

impl error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            DiscoveryError::Io(e) => Some(e),
            DiscoveryError::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DiscoveryError {
    fn from(e: io::Error) -> Self {
        DiscoveryError::Io(e)
    }
}

impl From<StunEncodeError> for DiscoveryError {
    fn from(e: StunEncodeError) -> Self {
        DiscoveryError::Encode(e)
    }
}

/// Resolves `host:port`, keeping the first address returned
pub(crate) async fn resolve(host: &str, port: u16) -> Result<SocketAddr, DiscoveryError> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| DiscoveryError::Resolution(format!("{}:{}: {}", host, port, e)))?;
    let addr = addrs
        .next()
        .ok_or_else(|| DiscoveryError::Resolution(format!("{}:{}", host, port)))?;
    debug!("Resolved {}:{} to {}", host, port, addr);
    Ok(addr)
}
