use crate::attributes::{
    AddressRole, AttributeType, ErrorCode, StunAttribute, ATTRIBUTE_HEADER_SIZE,
};
use crate::common::padding;
use crate::error::{StunError, StunErrorType};
use crate::raw::HEADER_SIZE;
use crate::types::{Cookie, TransactionId};
use std::convert::TryFrom;
use std::net::SocketAddr;

/// The STUN message type field, combining the method and the class.
/// ```text
///  0                 1
///  2  3  4 5 6 7 8 9 0 1 2 3 4 5
/// +--+--+-+-+-+-+-+-+-+-+-+-+-+-+
/// |M |M |M|M|M|C|M|M|M|C|M|M|M|M|
/// |11|10|9|8|7|1|6|5|4|0|3|2|1|0|
/// +--+--+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageType {
    method: MessageMethod,
    class: MessageClass,
}

impl MessageType {
    /// Creates a new message type.
    pub fn new(method: MessageMethod, class: MessageClass) -> Self {
        Self { method, class }
    }

    /// Returns the message class.
    pub fn class(&self) -> MessageClass {
        self.class
    }

    /// Returns the message method
    pub fn method(&self) -> MessageMethod {
        self.method
    }

    /// Returns the 14-bit wire value
    pub fn as_u16(&self) -> u16 {
        let method = self.method.as_u16();
        let class = self.class.as_u16();
        ((method & 0x0F80) << 2)
            | ((method & 0x0070) << 1)
            | (method & 0x000F)
            | ((class & 0x0002) << 7)
            | ((class & 0x0001) << 4)
    }
}

impl TryFrom<u16> for MessageType {
    type Error = StunError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value & 0xC000 != 0 {
            return Err(StunError::new(
                StunErrorType::InvalidHeader,
                format!("Leading bits of message type {:#06x} are not zero", value),
            ));
        }
        let class = match ((value & 0x0100) >> 7) | ((value & 0x0010) >> 4) {
            0b00 => MessageClass::Request,
            0b01 => MessageClass::Indication,
            0b10 => MessageClass::SuccessResponse,
            _ => MessageClass::ErrorResponse,
        };
        let method =
            MessageMethod(((value & 0x3E00) >> 2) | ((value & 0x00E0) >> 1) | (value & 0x000F));
        Ok(MessageType::new(method, class))
    }
}

/// The message method, a 12-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MessageMethod(pub(crate) u16);

impl MessageMethod {
    /// Returns the [`u16`] representation of this method.
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for MessageMethod {
    type Error = StunError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        (value & 0xF000 == 0)
            .then_some(MessageMethod(value))
            .ok_or_else(|| {
                StunError::new(
                    StunErrorType::InvalidParam,
                    format!("Value '{:#02x}' is not a valid a MessageMethod", value),
                )
            })
    }
}

/// The message class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageClass {
    /// request
    Request,
    /// indication
    Indication,
    /// success response
    SuccessResponse,
    /// error response
    ErrorResponse,
}

impl MessageClass {
    fn as_u16(&self) -> u16 {
        match self {
            MessageClass::Request => 0b00,
            MessageClass::Indication => 0b01,
            MessageClass::SuccessResponse => 0b10,
            MessageClass::ErrorResponse => 0b11,
        }
    }
}

#[derive(Debug)]
struct StunMessageParameters {
    method: MessageMethod,
    class: MessageClass,
    cookie: Option<Cookie>,
    transaction_id: Option<TransactionId>,
    attributes: Vec<StunAttribute>,
}

/// The [`StunMessage`] builder.
/// # Examples
///```rust
/// # use stun_proto::attributes::Software;
/// # use stun_proto::methods::BINDING;
/// # use stun_proto::{MessageClass, StunMessageBuilder};
/// let software = Software::new("STUN test client").unwrap();
/// let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
///     .with_attribute(software)
///     .build();
/// assert_eq!(msg.attributes().len(), 1);
/// assert!(msg.has_magic_cookie());
/// // 4 bytes of attribute header plus 16 bytes of value
/// assert_eq!(msg.message_length(), 20);
///```
#[derive(Debug)]
pub struct StunMessageBuilder(StunMessageParameters);

impl StunMessageBuilder {
    /// Creates a new builder.
    pub fn new(method: MessageMethod, class: MessageClass) -> StunMessageBuilder {
        Self(StunMessageParameters {
            method,
            class,
            cookie: None,
            transaction_id: None,
            attributes: Vec::new(),
        })
    }

    /// Sets the transaction ID. A random one is generated if none is set.
    pub fn with_transaction_id(mut self, transaction_id: TransactionId) -> Self {
        self.0.transaction_id = Some(transaction_id);
        self
    }

    /// Sets the cookie field. Defaults to the magic cookie; use a random
    /// [`Cookie`] to build classic RFC 3489 messages.
    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.0.cookie = Some(cookie);
        self
    }

    /// Appends an attribute. Order is preserved on the wire.
    pub fn with_attribute<T>(mut self, attribute: T) -> Self
    where
        T: Into<StunAttribute>,
    {
        self.0.attributes.push(attribute.into());
        self
    }

    /// Creates the STUN message.
    pub fn build(self) -> StunMessage {
        StunMessage {
            method: self.0.method,
            class: self.0.class,
            cookie: self.0.cookie.unwrap_or_default(),
            transaction_id: self.0.transaction_id.unwrap_or_default(),
            attributes: self.0.attributes,
        }
    }
}

/// The STUN message.
#[derive(Debug, Clone, PartialEq)]
pub struct StunMessage {
    method: MessageMethod,
    class: MessageClass,
    cookie: Cookie,
    transaction_id: TransactionId,
    attributes: Vec<StunAttribute>,
}

impl StunMessage {
    pub(crate) fn new(
        msg_type: MessageType,
        cookie: Cookie,
        transaction_id: TransactionId,
        attributes: Vec<StunAttribute>,
    ) -> Self {
        Self {
            method: msg_type.method(),
            class: msg_type.class(),
            cookie,
            transaction_id,
            attributes,
        }
    }

    /// Returns the STUN method
    pub fn method(&self) -> MessageMethod {
        self.method
    }

    /// Returns the STUN class
    pub fn class(&self) -> MessageClass {
        self.class
    }

    /// Returns the message type
    pub fn message_type(&self) -> MessageType {
        MessageType::new(self.method, self.class)
    }

    /// Returns the cookie field
    pub fn cookie(&self) -> Cookie {
        self.cookie
    }

    /// Returns `true` if the cookie field holds the RFC 5389 magic cookie
    pub fn has_magic_cookie(&self) -> bool {
        self.cookie.is_magic()
    }

    /// Returns the transaction-id
    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    /// Returns the attributes contained in this STUN message.
    pub fn attributes(&self) -> &[StunAttribute] {
        &self.attributes
    }

    /// Returns the first attribute of the given type
    pub fn get(&self, attr_type: AttributeType) -> Option<&StunAttribute> {
        self.attributes
            .iter()
            .find(|&attr| attr.attribute_type() == attr_type)
    }

    /// Returns `true` if an attribute of the given type is present
    pub fn contains(&self, attr_type: AttributeType) -> bool {
        self.get(attr_type).is_some()
    }

    /// Length of the attribute section, header excluded. It is derived from the
    /// attributes, so it always matches what gets encoded.
    pub fn message_length(&self) -> usize {
        self.attributes
            .iter()
            .map(|attr| {
                let size = attr.value_size();
                ATTRIBUTE_HEADER_SIZE + size + padding(size)
            })
            .sum()
    }

    /// Size of the whole message once encoded
    pub fn encoded_size(&self) -> usize {
        HEADER_SIZE + self.message_length()
    }

    fn address(&self, role: AddressRole) -> Option<SocketAddr> {
        self.get(role.attribute_type())
            .and_then(|attr| attr.as_address().ok())
            .map(|attr| attr.address())
    }

    /// Address in the `XOR-MAPPED-ADDRESS` attribute
    pub fn xor_mapped_address(&self) -> Option<SocketAddr> {
        self.address(AddressRole::XorMappedAddress)
    }

    /// Address in the `MAPPED-ADDRESS` attribute
    pub fn mapped_address(&self) -> Option<SocketAddr> {
        self.address(AddressRole::MappedAddress)
    }

    /// Reflexive transport address: `XOR-MAPPED-ADDRESS`, or `MAPPED-ADDRESS` as sent by
    /// RFC 3489 servers.
    pub fn reflexive_address(&self) -> Option<SocketAddr> {
        self.xor_mapped_address().or_else(|| self.mapped_address())
    }

    /// Address in the `OTHER-ADDRESS` attribute
    pub fn other_address(&self) -> Option<SocketAddr> {
        self.address(AddressRole::OtherAddress)
    }

    /// Address in the `CHANGED-ADDRESS` attribute
    pub fn changed_address(&self) -> Option<SocketAddr> {
        self.address(AddressRole::ChangedAddress)
    }

    /// Alternate endpoint of the server: `OTHER-ADDRESS`, or `CHANGED-ADDRESS` as sent by
    /// RFC 3489 servers.
    pub fn alternate_address(&self) -> Option<SocketAddr> {
        self.other_address().or_else(|| self.changed_address())
    }

    /// Address in the `RESPONSE-ORIGIN` attribute
    pub fn response_origin(&self) -> Option<SocketAddr> {
        self.address(AddressRole::ResponseOrigin)
    }

    /// The `ERROR-CODE` attribute, if any
    pub fn error_code(&self) -> Option<&ErrorCode> {
        self.get(AttributeType::ERROR_CODE)
            .and_then(|attr| attr.as_error_code().ok())
    }

    /// Types of the comprehension required attributes that were not understood. A
    /// server answers a request carrying any of them with a 420 error.
    pub fn unknown_comprehension_required(&self) -> Vec<AttributeType> {
        self.attributes
            .iter()
            .filter(|attr| attr.is_unknown())
            .map(|attr| attr.attribute_type())
            .filter(|attr_type| attr_type.is_comprehension_required())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AddressAttribute, ChangeRequest, Software, Unknown};
    use crate::methods::{BINDING, SHARED_SECRET};
    use std::str::FromStr;

    #[test]
    fn message_method() {
        let m = MessageMethod::try_from(0x0000).expect("Can not create MessageMethod");
        assert_eq!(m.as_u16(), 0x0000);

        let m = MessageMethod::try_from(0x0FFF).expect("Can not create MessageMethod");
        assert_eq!(m.as_u16(), 0x0FFF);

        MessageMethod::try_from(0x1000).expect_err("MessageMethod should not be created");
    }

    #[test]
    fn encode_message_type() {
        let method = MessageMethod::try_from(0x08D8).expect("Can not create MessageMethod");

        let msg_type = MessageType::new(method, MessageClass::Request);
        assert_eq!(msg_type.as_u16(), 0x22A8);

        let msg_type = MessageType::new(method, MessageClass::Indication);
        assert_eq!(msg_type.as_u16(), 0x22B8);

        let msg_type = MessageType::new(method, MessageClass::SuccessResponse);
        assert_eq!(msg_type.as_u16(), 0x23A8);

        let msg_type = MessageType::new(method, MessageClass::ErrorResponse);
        assert_eq!(msg_type.as_u16(), 0x23B8);

        let msg_type = MessageType::new(BINDING, MessageClass::SuccessResponse);
        assert_eq!(msg_type.as_u16(), 0x0101);

        let method = MessageMethod::try_from(0x0FFF).expect("Can not create MessageMethod");
        let msg_type = MessageType::new(method, MessageClass::Request);
        assert_eq!(msg_type.as_u16(), 0x3EEF);
    }

    #[test]
    fn decode_message_type() {
        let method = MessageMethod::try_from(0x08D8).expect("Can not create MessageMethod");
        for (value, class) in [
            (0x22A8, MessageClass::Request),
            (0x22B8, MessageClass::Indication),
            (0x23A8, MessageClass::SuccessResponse),
            (0x23B8, MessageClass::ErrorResponse),
        ] {
            let msg_type = MessageType::try_from(value).expect("Can not decode type");
            assert_eq!(msg_type.class(), class);
            assert_eq!(msg_type.method(), method);
            assert_eq!(msg_type.as_u16(), value);
        }

        let msg_type = MessageType::try_from(0x0112).expect("Can not decode type");
        assert_eq!(msg_type.method(), SHARED_SECRET);
        assert_eq!(msg_type.class(), MessageClass::ErrorResponse);

        assert_eq!(
            MessageType::try_from(0x4001).expect_err("Error expected"),
            StunErrorType::InvalidHeader
        );
    }

    #[test]
    fn message_length_follows_attributes() {
        let msg = StunMessageBuilder::new(BINDING, MessageClass::Request).build();
        assert_eq!(msg.message_length(), 0);
        assert_eq!(msg.encoded_size(), 20);

        let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
            .with_attribute(ChangeRequest::new(true, true))
            .with_attribute(Software::new("abcde").expect("Can not create SOFTWARE"))
            .with_attribute(Unknown::new(AttributeType::from(0x9999), vec![0u8; 6]))
            .build();
        // 8 + (4 + 5 + 3) + (4 + 6 + 2)
        assert_eq!(msg.message_length(), 32);
        assert_eq!(msg.encoded_size(), 52);
    }

    #[test]
    fn address_helpers() {
        let mapped = SocketAddr::from_str("198.51.100.7:1024").expect("Can not parse address");
        let other = SocketAddr::from_str("192.0.2.2:3479").expect("Can not parse address");

        let msg = StunMessageBuilder::new(BINDING, MessageClass::SuccessResponse)
            .with_attribute(AddressAttribute::mapped_address(mapped))
            .with_attribute(AddressAttribute::changed_address(other))
            .build();
        assert_eq!(msg.xor_mapped_address(), None);
        assert_eq!(msg.reflexive_address(), Some(mapped));
        assert_eq!(msg.other_address(), None);
        assert_eq!(msg.alternate_address(), Some(other));

        let xor_mapped = SocketAddr::from_str("203.0.113.9:40000").expect("Can not parse address");
        let msg = StunMessageBuilder::new(BINDING, MessageClass::SuccessResponse)
            .with_attribute(AddressAttribute::mapped_address(mapped))
            .with_attribute(AddressAttribute::xor_mapped_address(xor_mapped))
            .with_attribute(AddressAttribute::other_address(other))
            .build();
        assert_eq!(msg.reflexive_address(), Some(xor_mapped));
        assert_eq!(msg.alternate_address(), Some(other));
        assert!(msg.contains(AttributeType::OTHER_ADDRESS));
        assert!(msg.error_code().is_none());
    }

    #[test]
    fn builder_defaults() {
        let msg = StunMessageBuilder::new(BINDING, MessageClass::Request).build();
        assert!(msg.has_magic_cookie());
        assert_eq!(msg.method(), BINDING);
        assert_eq!(msg.class(), MessageClass::Request);

        let tid = TransactionId::from([1u8; 12]);
        let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
            .with_cookie(Cookie::new(0x0102_0304))
            .with_transaction_id(tid)
            .build();
        assert!(!msg.has_magic_cookie());
        assert_eq!(msg.transaction_id(), &tid);
    }

    #[test]
    fn unknown_comprehension_required() {
        let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
            .with_attribute(Unknown::new(AttributeType::from(0x0024), vec![0u8; 4]))
            .with_attribute(Unknown::new(AttributeType::from(0x8029), vec![0u8; 8]))
            .with_attribute(Software::new("x").expect("Can not create SOFTWARE"))
            .build();
        assert_eq!(
            msg.unknown_comprehension_required(),
            vec![AttributeType::from(0x0024)]
        );
    }
}
