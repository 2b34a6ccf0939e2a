//! STUN message codec.
//!
//! This crate encodes and decodes STUN messages as defined by:
//! * [`RFC3489`](https://datatracker.ietf.org/doc/html/rfc3489). STUN - Simple Traversal of
//!   User Datagram Protocol (UDP) Through Network Address Translators (NATs).
//! * [`RFC5389`](https://datatracker.ietf.org/doc/html/rfc5389). Session Traversal
//!   Utilities for NAT (STUN).
//! * [`RFC5780`](https://datatracker.ietf.org/doc/html/rfc5780). NAT Behavior Discovery
//!   Using Session Traversal Utilities for NAT (STUN).
//! * [`RFC5769`](https://datatracker.ietf.org/doc/html/rfc5769). Test Vectors for Session
//!   Traversal Utilities for NAT (STUN).
//!
//! The three documents overlap: they share the header layout but each one defines its own
//! attributes. A [`Dialect`] selects which attribute tables are used to decode a message.
//!
//! # Usage
//! Example that creates and encodes a STUN Binding request asking the server to answer
//! from its alternate address and port.
//!```rust
//! # use stun_proto::attributes::{ChangeRequest, Fingerprint, Software};
//! # use stun_proto::{MessageClass, MessageEncoderBuilder, StunMessageBuilder};
//! # use stun_proto::methods::BINDING;
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
//!     .with_attribute(Software::new("nat check")?)
//!     .with_attribute(ChangeRequest::new(true, true))
//!     .with_attribute(Fingerprint::default())
//!     .build();
//!
//! let encoder = MessageEncoderBuilder::default().build();
//! let mut buffer: [u8; 64] = [0x00; 64];
//! let size = encoder.encode(&mut buffer, &msg)?;
//! assert_eq!(size, 52);
//! #
//! #   Ok(())
//! # }
//!```
//!
//! Example that decodes the answer of a classic RFC 3489 server. Such servers do not use
//! the magic cookie, so the message is decoded with the RFC 3489 attribute table.
//!```rust
//! # use stun_proto::{Dialect, MessageClass, MessageDecoderBuilder};
//! # use stun_proto::methods::BINDING;
//! # use std::net::SocketAddr;
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let response = [
//!     0x01, 0x01, 0x00, 0x18, // Binding success response, 24 bytes of attributes
//!     0x5a, 0x3c, 0x21, 0x0f, // }
//!     0x0b, 0x1d, 0x66, 0x02, // }  128-bit transaction id
//!     0x4e, 0xa9, 0x13, 0x70, // }
//!     0x8c, 0x21, 0xd5, 0x3b, // }
//!     0x00, 0x01, 0x00, 0x08, // MAPPED-ADDRESS, 8 bytes
//!     0x00, 0x01, 0xc3, 0x50, // IPv4, port 50000
//!     0xc6, 0x33, 0x64, 0x07, // 198.51.100.7
//!     0x00, 0x05, 0x00, 0x08, // CHANGED-ADDRESS, 8 bytes
//!     0x00, 0x01, 0x0d, 0x97, // IPv4, port 3479
//!     0xc0, 0x00, 0x02, 0x02, // 192.0.2.2
//! ];
//!
//! let decoder = MessageDecoderBuilder::default().build();
//! let (msg, size) = decoder.decode(&response)?;
//! assert_eq!(size, response.len());
//! assert_eq!(msg.method(), BINDING);
//! assert_eq!(msg.class(), MessageClass::SuccessResponse);
//! assert!(!msg.has_magic_cookie());
//! assert_eq!(Dialect::from_cookie(msg.cookie()), Dialect::Rfc3489);
//!
//! let mapped: SocketAddr = "198.51.100.7:50000".parse()?;
//! assert_eq!(msg.reflexive_address(), Some(mapped));
//! let changed: SocketAddr = "192.0.2.2:3479".parse()?;
//! assert_eq!(msg.alternate_address(), Some(changed));
//! #
//! #   Ok(())
//! # }
//!```
//!
//! Message integrity and fingerprint are only checked when the decoder is built with
//! [`DecoderContextBuilder::with_validation`].

#![deny(missing_docs)]

mod common;
mod context;
mod cursor;
mod dialect;
mod message;
mod raw;
mod types;

pub mod attributes;
pub mod error;
pub mod methods;

pub use crate::attributes::{AttributeType, StunAttribute, StunAttributeType};
pub use crate::context::{
    DecoderContext, DecoderContextBuilder, MessageDecoder, MessageDecoderBuilder,
};
pub use crate::context::{MessageEncoder, MessageEncoderBuilder};
pub use crate::cursor::{BitCursor, BitWriter};
pub use crate::dialect::Dialect;
pub use crate::error::{StunDecodeError, StunEncodeError, StunError, StunErrorType};
pub use crate::message::{
    MessageClass, MessageMethod, MessageType, StunMessage, StunMessageBuilder,
};
pub use crate::raw::{message_size, HEADER_SIZE};
pub use crate::types::{
    AddressFamily, Cookie, CredentialMechanism, HMACKey, TransactionId, MAGIC_COOKIE,
};
