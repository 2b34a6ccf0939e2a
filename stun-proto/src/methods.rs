//! STUN Methods Registry

use crate::message::MessageMethod;

/// Reserved
pub const RESERVED: MessageMethod = MessageMethod(0x0000);

/// Binding
pub const BINDING: MessageMethod = MessageMethod(0x0001);

/// Shared secret. Only defined by RFC 3489, retired by RFC 5389.
pub const SHARED_SECRET: MessageMethod = MessageMethod(0x0002);
