//! Protocol dialects.
//!
//! RFC 3489, RFC 5389 and RFC 5780 define overlapping sets of attributes and disagree on
//! which messages are valid. A [`Dialect`] selects the attribute table used to decode a
//! message, or all of them in priority order with [`Dialect::Mix`].

use crate::attributes::{rfc3489, rfc5389, rfc5780, AttributeType, StunAttribute};
use crate::context::AttributeContext;
use crate::cursor::BitCursor;
use crate::error::{StunError, StunErrorType};
use crate::message::{MessageClass, MessageMethod};
use crate::methods::{BINDING, SHARED_SECRET};
use crate::types::Cookie;

/// Protocol dialect used to interpret a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Classic STUN, RFC 3489
    Rfc3489,
    /// STUN, RFC 5389
    Rfc5389,
    /// NAT behavior discovery, RFC 5780
    Rfc5780,
    /// Every table, tried in the order RFC 5780, RFC 5389, RFC 3489
    Mix,
}

impl Dialect {
    /// Dialect assumed when none is configured: messages carrying the magic cookie may use
    /// any table, anything else is classic STUN.
    pub fn from_cookie(cookie: Cookie) -> Self {
        if cookie.is_magic() {
            Dialect::Mix
        } else {
            Dialect::Rfc3489
        }
    }

    /// Returns `true` if the dialect has a decoder for `attr_type`
    pub fn recognizes(&self, attr_type: AttributeType) -> bool {
        match self {
            Dialect::Rfc3489 => rfc3489::is_known(attr_type),
            Dialect::Rfc5389 => rfc5389::is_known(attr_type),
            Dialect::Rfc5780 => rfc5780::is_known(attr_type),
            Dialect::Mix => {
                rfc5780::is_known(attr_type)
                    || rfc5389::is_known(attr_type)
                    || rfc3489::is_known(attr_type)
            }
        }
    }

    /// Checks that the class and method combination exists in this dialect
    pub fn check_message_type(
        &self,
        method: MessageMethod,
        class: MessageClass,
    ) -> Result<(), StunError> {
        match self {
            Dialect::Rfc3489 => {
                if class == MessageClass::Indication {
                    return Err(StunError::new(
                        StunErrorType::UnsupportedMessage,
                        "RFC 3489 does not define indications",
                    ));
                }
                if method != BINDING && method != SHARED_SECRET {
                    return Err(StunError::new(
                        StunErrorType::UnsupportedMessage,
                        format!("Method {:#05x} is not defined by RFC 3489", method.as_u16()),
                    ));
                }
            }
            Dialect::Rfc5389 | Dialect::Rfc5780 => {
                if method == SHARED_SECRET {
                    return Err(StunError::new(
                        StunErrorType::UnsupportedMessage,
                        "Shared secret was retired by RFC 5389",
                    ));
                }
            }
            Dialect::Mix => {}
        }
        Ok(())
    }

    pub(crate) fn decode_attribute(
        &self,
        ctx: &AttributeContext,
        attr_type: AttributeType,
        cursor: &mut BitCursor,
    ) -> Result<Option<StunAttribute>, StunError> {
        match self {
            Dialect::Rfc3489 => rfc3489::decode(ctx, attr_type, cursor),
            Dialect::Rfc5389 => rfc5389::decode(ctx, attr_type, cursor),
            Dialect::Rfc5780 => rfc5780::decode(ctx, attr_type, cursor),
            Dialect::Mix => {
                // Tables leave the cursor untouched when they do not know the type
                if let Some(attr) = rfc5780::decode(ctx, attr_type, cursor)? {
                    return Ok(Some(attr));
                }
                if let Some(attr) = rfc5389::decode(ctx, attr_type, cursor)? {
                    return Ok(Some(attr));
                }
                rfc3489::decode(ctx, attr_type, cursor)
            }
        }
    }
}
