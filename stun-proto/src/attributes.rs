//! STUN Attributes.
//! This module contains the attributes defined by RFC 3489, RFC 5389 and RFC 5780, and the
//! per dialect tables used to decode them.

use crate::context::{AttributeContext, DecoderContext};
use crate::cursor::{BitCursor, BitWriter};
use crate::error::StunError;
use std::fmt;

mod address;
mod change_request;
mod error_code;
mod integrity;
mod response_port;
mod text;
mod unknown;

pub mod rfc3489;
pub mod rfc5389;
pub mod rfc5780;

pub use address::{AddressAttribute, AddressRole};
pub use change_request::{ChangeRequest, ChangeRequestFlags};
pub use error_code::ErrorCode;
pub use integrity::{Fingerprint, MessageIntegrity};
pub(crate) use integrity::patched_prefix;
pub use response_port::ResponsePort;
pub use text::{Nonce, Padding, Password, Realm, Software, UserName};
pub use unknown::{Unknown, UnknownAttributes};

pub(crate) const ATTRIBUTE_HEADER_SIZE: usize = 4;

pub(crate) trait Verifiable {
    /// `input` holds the message bytes preceding the attribute, with the header length
    /// already adjusted to end right after it.
    fn verify(&self, input: &[u8], ctx: &DecoderContext) -> bool;
}

pub(crate) trait AsVerifiable {
    fn as_verifiable_ref(&self) -> Option<&dyn Verifiable> {
        None
    }
}

pub(crate) trait EncodeAttributeValue {
    /// Size of the value, padding excluded
    fn value_size(&self) -> usize;
    /// Writes the value. The writer is positioned right after the attribute header, and
    /// everything written before belongs to the same message.
    fn encode(&self, ctx: &AttributeContext, writer: &mut BitWriter) -> Result<(), StunError>;
}

pub(crate) trait DecodeAttributeValue {
    /// Decodes a value from a cursor spanning exactly the declared attribute length.
    fn decode(ctx: &AttributeContext, cursor: &mut BitCursor) -> Result<Self, StunError>
    where
        Self: Sized;
}

/// The STUN Attribute type
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct AttributeType(u16);

impl AttributeType {
    /// `MAPPED-ADDRESS`
    pub const MAPPED_ADDRESS: AttributeType = AttributeType(0x0001);
    /// `RESPONSE-ADDRESS`
    pub const RESPONSE_ADDRESS: AttributeType = AttributeType(0x0002);
    /// `CHANGE-REQUEST`
    pub const CHANGE_REQUEST: AttributeType = AttributeType(0x0003);
    /// `SOURCE-ADDRESS`
    pub const SOURCE_ADDRESS: AttributeType = AttributeType(0x0004);
    /// `CHANGED-ADDRESS`
    pub const CHANGED_ADDRESS: AttributeType = AttributeType(0x0005);
    /// `USERNAME`
    pub const USER_NAME: AttributeType = AttributeType(0x0006);
    /// `PASSWORD`
    pub const PASSWORD: AttributeType = AttributeType(0x0007);
    /// `MESSAGE-INTEGRITY`
    pub const MESSAGE_INTEGRITY: AttributeType = AttributeType(0x0008);
    /// `ERROR-CODE`
    pub const ERROR_CODE: AttributeType = AttributeType(0x0009);
    /// `UNKNOWN-ATTRIBUTES`
    pub const UNKNOWN_ATTRIBUTES: AttributeType = AttributeType(0x000A);
    /// `REFLECTED-FROM`
    pub const REFLECTED_FROM: AttributeType = AttributeType(0x000B);
    /// `REALM`
    pub const REALM: AttributeType = AttributeType(0x0014);
    /// `NONCE`
    pub const NONCE: AttributeType = AttributeType(0x0015);
    /// `XOR-MAPPED-ADDRESS`
    pub const XOR_MAPPED_ADDRESS: AttributeType = AttributeType(0x0020);
    /// `PADDING`
    pub const PADDING: AttributeType = AttributeType(0x0026);
    /// `RESPONSE-PORT`
    pub const RESPONSE_PORT: AttributeType = AttributeType(0x0027);
    /// `SOFTWARE`
    pub const SOFTWARE: AttributeType = AttributeType(0x8022);
    /// `ALTERNATE-SERVER`
    pub const ALTERNATE_SERVER: AttributeType = AttributeType(0x8023);
    /// `FINGERPRINT`
    pub const FINGERPRINT: AttributeType = AttributeType(0x8028);
    /// `RESPONSE-ORIGIN`
    pub const RESPONSE_ORIGIN: AttributeType = AttributeType(0x802B);
    /// `OTHER-ADDRESS`
    pub const OTHER_ADDRESS: AttributeType = AttributeType(0x802C);

    /// Creates a new attribute type
    pub fn new(attr_type: u16) -> Self {
        AttributeType(attr_type)
    }

    /// Returns the [`u16`] representation of the attribute type.
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true if the attribute is comprehension required
    pub fn is_comprehension_required(&self) -> bool {
        // Comprehension-required range (0x0000-0x7FFF):
        self.0 < 0x8000
    }

    /// Returns true if the attribute is comprehension optional
    pub fn is_comprehension_optional(&self) -> bool {
        // Comprehension-optional range (0x8000-0xFFFF)
        !self.is_comprehension_required()
    }
}

impl From<u16> for AttributeType {
    fn from(val: u16) -> Self {
        Self::new(val)
    }
}

impl From<AttributeType> for u16 {
    fn from(val: AttributeType) -> Self {
        val.0
    }
}

impl fmt::Debug for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AttributeType (0x{:04X})", self.0)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "attribute type (0x{:04X})", self.0)
    }
}

/// Trait implemented by every STUN attribute
pub trait StunAttributeType {
    /// Returns the wire type of this attribute
    fn attribute_type(&self) -> AttributeType;
}

// Attributes whose wire type does not depend on their value
macro_rules! stun_attribute (
    ($attr_class:ident, $attr_type:ident) => {
        impl $attr_class {
            /// Wire type of this attribute
            pub const TYPE: crate::attributes::AttributeType =
                crate::attributes::AttributeType::$attr_type;
        }

        impl crate::attributes::StunAttributeType for $attr_class {
            fn attribute_type(&self) -> crate::attributes::AttributeType {
                crate::attributes::AttributeType::$attr_type
            }
        }
    }
);
pub(crate) use stun_attribute;

macro_rules! stun_attribute_impl (
    ($(($variant:ident, $class:ident)),*) => {
        paste::paste! {
            /// STUN attribute, as decoded from or encoded into a message
            #[derive(Debug, Clone, PartialEq)]
            pub enum StunAttribute {
                $(
                    #[doc = "The `" $class "` attribute"]
                    $variant($class),
                )*
            }
        }

        $(
            impl From<$class> for StunAttribute {
                fn from(value: $class) -> Self {
                    StunAttribute::$variant(value)
                }
            }
        )*

        impl AsVerifiable for StunAttribute {
            fn as_verifiable_ref(&self) -> Option<&dyn Verifiable> {
                match self {
                    $(StunAttribute::$variant(attr) => attr.as_verifiable_ref(),)*
                }
            }
        }

        impl StunAttribute {
            /// Returns the wire type of this attribute
            pub fn attribute_type(&self) -> AttributeType {
                match self {
                    $(StunAttribute::$variant(attr) => attr.attribute_type(),)*
                }
            }

            /// Returns the declared length of the value, padding excluded
            pub fn value_size(&self) -> usize {
                match self {
                    $(StunAttribute::$variant(attr) => attr.value_size(),)*
                }
            }

            pub(crate) fn encode_value(
                &self,
                ctx: &AttributeContext,
                writer: &mut BitWriter,
            ) -> Result<(), StunError> {
                match self {
                    $(StunAttribute::$variant(attr) => attr.encode(ctx, writer),)*
                }
            }

            $(
                paste::paste! {
                    #[doc = "Returns true if this `StunAttribute` is `" $variant "`"]
                    pub fn [<is_ $variant:snake>] (&self) -> bool {
                        matches!(self, StunAttribute::$variant(_))
                    }

                    #[doc = "Returns a reference to the internal attribute value or an error"]
                    #[doc = "if the type of the attribute is not `" $variant "`"]
                    pub fn [<as_ $variant:snake>] (&self) -> Result<&$class, StunError> {
                        match self {
                            StunAttribute::$variant(attr) => Ok(attr),
                            _ => Err(StunError::new(
                                crate::error::StunErrorType::InvalidParam,
                                format!("Attribute is not of type {}", std::stringify!($variant))
                            )),
                        }
                    }

                    #[doc = "Returns a reference to the `" $variant "` attribute."]
                    #[doc = "# Panics"]
                    #[doc = "Panics if the attribute is not an `" $variant  "`"]
                    pub fn [<expect_ $variant:snake>](&self) -> &$class {
                        match self {
                            StunAttribute::$variant(attr) => attr,
                            other => panic!(
                                "Expected {}, got {:?}",
                                std::stringify!($variant),
                                other.attribute_type()
                            ),
                        }
                    }
                }
            )*
        }
    }
);

stun_attribute_impl!(
    (Address, AddressAttribute),
    (ChangeRequest, ChangeRequest),
    (ErrorCode, ErrorCode),
    (Fingerprint, Fingerprint),
    (MessageIntegrity, MessageIntegrity),
    (Nonce, Nonce),
    (Padding, Padding),
    (Password, Password),
    (Realm, Realm),
    (ResponsePort, ResponsePort),
    (Software, Software),
    (Unknown, Unknown),
    (UnknownAttributes, UnknownAttributes),
    (UserName, UserName)
);
