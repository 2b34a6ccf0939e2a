use crate::attributes::{
    patched_prefix, AsVerifiable, AttributeType, StunAttribute, Unknown, ATTRIBUTE_HEADER_SIZE,
};
use crate::common::{check_buffer_boundaries, DEFAULT_PADDING_VALUE};
use crate::cursor::{BitCursor, BitWriter};
use crate::dialect::Dialect;
use crate::error::{
    StunAttributeError, StunDecodeError, StunEncodeError, StunError, StunErrorLevel, StunErrorType,
    StunMessageError,
};
use crate::message::{MessageType, StunMessage};
use crate::raw::{RawMessage, LENGTH_OFFSET};
use crate::types::{Cookie, HMACKey, TransactionId};
use fallible_iterator::FallibleIterator;
use std::convert::TryFrom;

/// Header fields an attribute may need to encode or decode its value
#[derive(Debug, Clone)]
pub(crate) struct AttributeContext {
    pub(crate) cookie: Cookie,
    pub(crate) transaction_id: TransactionId,
}

/// Builder class used to construct [`DecoderContext`] objects
#[derive(Debug, Default)]
pub struct DecoderContextBuilder(DecoderContext);

impl DecoderContextBuilder {
    /// Decodes messages with a fixed dialect. When no dialect is set, messages carrying
    /// the magic cookie are decoded with [`Dialect::Mix`] and the rest with
    /// [`Dialect::Rfc3489`].
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.0.dialect = Some(dialect);
        self
    }

    /// Configure the builder to use a key to decode messages
    pub fn with_key(mut self, key: HMACKey) -> Self {
        self.0.key = Some(key);
        self
    }

    /// Whether this decoder will validate attributes. `FINGERPRINT` is always checked,
    /// `MESSAGE-INTEGRITY` only if a key is configured.
    pub fn with_validation(mut self) -> Self {
        self.0.validation = true;
        self
    }

    /// Agents ignore attributes that follow `MESSAGE-INTEGRITY`, except `FINGERPRINT`,
    /// and anything that follows `FINGERPRINT`. Use this flag to decode them anyway.
    pub fn with_trailing_attributes(mut self) -> Self {
        self.0.trailing_attributes = true;
        self
    }

    /// Builds a [`DecoderContext`]
    pub fn build(self) -> DecoderContext {
        self.0
    }
}

/// Context used to decode STUN messages
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct DecoderContext {
    dialect: Option<Dialect>,
    key: Option<HMACKey>,
    validation: bool,
    trailing_attributes: bool,
}

impl DecoderContext {
    /// Dialect used to decode messages, if fixed
    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    /// Key used for integrity hashes
    pub fn key(&self) -> Option<&HMACKey> {
        self.key.as_ref()
    }

    /// Whether validation is required to decoding
    pub fn validate(&self) -> bool {
        self.validation
    }

    /// Whether attributes following `MESSAGE-INTEGRITY` or `FINGERPRINT` are kept
    pub fn trailing_attributes(&self) -> bool {
        self.trailing_attributes
    }
}

/// Builder class used to create a stun [`MessageDecoder`]
#[derive(Debug, Default)]
pub struct MessageDecoderBuilder(MessageDecoder);

impl MessageDecoderBuilder {
    /// Adds a context to the builder
    pub fn with_context(mut self, ctx: DecoderContext) -> Self {
        self.0.ctx = ctx;
        self
    }

    /// Builds a [`MessageDecoder`]
    pub fn build(self) -> MessageDecoder {
        self.0
    }
}

/// Class used to decode STUN messages
#[derive(Debug, Default, Clone)]
pub struct MessageDecoder {
    ctx: DecoderContext,
}

fn message_error(error: StunError) -> StunDecodeError {
    StunDecodeError(StunErrorLevel::Message(StunMessageError(error)))
}

fn attribute_error(
    attr_type: Option<AttributeType>,
    position: usize,
    error: StunError,
) -> StunDecodeError {
    StunDecodeError(StunErrorLevel::Attribute(StunAttributeError {
        attr_type,
        position,
        error,
    }))
}

#[derive(Debug, Default)]
struct AttributeFilter {
    message_integrity: bool,
    fingerprint: bool,
}

impl AttributeFilter {
    // Returns true if `attr_type` comes after the attributes closing the message
    fn ignore(&mut self, attr_type: AttributeType) -> bool {
        if self.fingerprint {
            return true;
        }
        if attr_type == AttributeType::FINGERPRINT {
            self.fingerprint = true;
            return false;
        }
        if self.message_integrity {
            return true;
        }
        if attr_type == AttributeType::MESSAGE_INTEGRITY {
            self.message_integrity = true;
        }
        false
    }
}

impl MessageDecoder {
    /// Decodes the STUN raw buffer
    /// # Arguments:
    /// - `buffer` - Raw buffer containing the STUN message
    /// # Returns:
    /// A tuple with [`StunMessage`] itself and the size consumed to decode the message,
    /// or an error describing the problem if the message could not be decoded. Bytes
    /// following the message are not consumed.
    pub fn decode(&self, buffer: &[u8]) -> Result<(StunMessage, usize), StunDecodeError> {
        let raw_msg = RawMessage::decode(buffer).map_err(message_error)?;
        if raw_msg.header.leading_bits != 0 {
            return Err(message_error(StunError::new(
                StunErrorType::InvalidHeader,
                format!(
                    "Leading bits must be zero, found {:#04b}",
                    raw_msg.header.leading_bits
                ),
            )));
        }

        let msg_type = MessageType::try_from(raw_msg.header.msg_type).map_err(message_error)?;
        let dialect = self
            .ctx
            .dialect()
            .unwrap_or_else(|| Dialect::from_cookie(raw_msg.header.cookie));
        dialect
            .check_message_type(msg_type.method(), msg_type.class())
            .map_err(message_error)?;

        let attr_ctx = AttributeContext {
            cookie: raw_msg.header.cookie,
            transaction_id: raw_msg.header.transaction_id,
        };

        let mut attributes: Vec<StunAttribute> = Vec::new();
        let mut filter = AttributeFilter::default();
        let mut iter = raw_msg.attributes();
        let mut position = 0;

        while let Some(raw_attr) = iter
            .next()
            .map_err(|error| attribute_error(None, position, error))?
        {
            let attr_type = AttributeType::from(raw_attr.attr_type);
            let index = position;
            position += 1;

            if filter.ignore(attr_type) && !self.ctx.trailing_attributes() {
                continue;
            }
            if attributes
                .iter()
                .any(|attr| attr.attribute_type() == attr_type)
            {
                continue;
            }

            let mut cursor = BitCursor::new(raw_attr.value);
            let attr = match dialect
                .decode_attribute(&attr_ctx, attr_type, &mut cursor)
                .map_err(|error| attribute_error(Some(attr_type), index, error))?
            {
                Some(attr) => {
                    if !cursor.is_empty() {
                        return Err(attribute_error(
                            Some(attr_type),
                            index,
                            StunError::new(
                                StunErrorType::MalformedAttribute,
                                format!("{} bytes left after the value", cursor.remaining_bytes()),
                            ),
                        ));
                    }
                    attr
                }
                None => Unknown::new(attr_type, raw_attr.value).into(),
            };

            if self.ctx.validate() {
                if let Some(verifiable) = attr.as_verifiable_ref() {
                    let input = patched_prefix(buffer, raw_attr.offset, raw_attr.value.len())
                        .map_err(|error| attribute_error(Some(attr_type), index, error))?;
                    if !verifiable.verify(&input, &self.ctx) {
                        return Err(attribute_error(
                            Some(attr_type),
                            index,
                            StunError::new(
                                StunErrorType::ValidationFailed,
                                "Attribute validation failed",
                            ),
                        ));
                    }
                }
            }

            attributes.push(attr);
        }

        let msg = StunMessage::new(
            msg_type,
            raw_msg.header.cookie,
            raw_msg.header.transaction_id,
            attributes,
        );
        Ok((msg, raw_msg.size()))
    }

    /// Gets the context associated to this decoder
    pub fn context(&self) -> &DecoderContext {
        &self.ctx
    }
}

/// Builder class used to create a stun [`MessageEncoder`]
#[derive(Debug, Default)]
pub struct MessageEncoderBuilder(MessageEncoder);

impl MessageEncoderBuilder {
    /// Configure the encoder to use a custom padding. RFC 5389 states that
    /// the padding bits MUST be set to zero on sending and MUST be ignored by the
    /// receiver. Nevertheless, the test vectors of
    /// [`RFC5769`](https://datatracker.ietf.org/doc/html/RFC5769) use non zero padding,
    /// this option allows to reproduce them byte to byte.
    pub fn with_padding(mut self, padding: u8) -> Self {
        self.0.padding = padding;
        self
    }

    /// Builds a [`MessageEncoder`]
    pub fn build(self) -> MessageEncoder {
        self.0
    }
}

/// Class used to encode STUN messages
#[derive(Debug, Clone)]
pub struct MessageEncoder {
    padding: u8,
}

impl Default for MessageEncoder {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING_VALUE,
        }
    }
}

fn encode_attribute(
    ctx: &AttributeContext,
    attr: &StunAttribute,
    writer: &mut BitWriter,
    padding: u8,
) -> Result<(), StunError> {
    let value_size = u16::try_from(attr.value_size())?;
    writer.write_u16(attr.attribute_type().as_u16())?;
    writer.write_u16(value_size)?;
    let start = writer.byte_position();
    attr.encode_value(ctx, writer)?;
    let written = writer.byte_position() - start;
    if written != usize::from(value_size) {
        return Err(StunError::new(
            StunErrorType::InvalidParam,
            format!(
                "Attribute declared {} bytes but wrote {}",
                value_size, written
            ),
        ));
    }
    writer.pad_to(ATTRIBUTE_HEADER_SIZE, padding)
}

impl MessageEncoder {
    /// Encodes a STUN message.
    /// # Arguments:
    /// - `buffer` - Output buffer where the message is written
    /// - `msg` - The STUN message
    /// # Returns:
    /// The number of bytes written, or an error if the buffer is too small or an
    /// attribute can not be encoded.
    pub fn encode(&self, buffer: &mut [u8], msg: &StunMessage) -> Result<usize, StunEncodeError> {
        let encode_error =
            |error: StunError| StunEncodeError(StunErrorLevel::Message(StunMessageError(error)));

        let size = msg.encoded_size();
        check_buffer_boundaries(buffer, size).map_err(encode_error)?;
        let length = u16::try_from(msg.message_length())
            .map_err(StunError::from)
            .map_err(encode_error)?;

        let mut writer = BitWriter::new(&mut buffer[..size]);
        let header = |writer: &mut BitWriter| -> Result<(), StunError> {
            writer.write_bits(0, 2)?;
            writer.write_bits(u128::from(msg.message_type().as_u16()), 14)?;
            // Backfilled once every attribute is written
            writer.write_u16(0)?;
            writer.write_u32(msg.cookie().as_u32())?;
            writer.write_bytes(msg.transaction_id().as_bytes())
        };
        header(&mut writer).map_err(encode_error)?;

        let ctx = AttributeContext {
            cookie: msg.cookie(),
            transaction_id: *msg.transaction_id(),
        };
        for (position, attr) in msg.attributes().iter().enumerate() {
            encode_attribute(&ctx, attr, &mut writer, self.padding).map_err(|error| {
                StunEncodeError(StunErrorLevel::Attribute(StunAttributeError {
                    attr_type: Some(attr.attribute_type()),
                    position,
                    error,
                }))
            })?;
        }

        writer
            .write_u16_at(LENGTH_OFFSET, length)
            .map_err(encode_error)?;
        Ok(writer.byte_position())
    }

    /// Encodes a STUN message into a newly allocated buffer of the exact size.
    pub fn encode_to_vec(&self, msg: &StunMessage) -> Result<Vec<u8>, StunEncodeError> {
        let mut buffer = vec![0u8; msg.encoded_size()];
        let size = self.encode(&mut buffer, msg)?;
        buffer.truncate(size);
        Ok(buffer)
    }

    /// Padding value used to align attributes
    pub fn padding(&self) -> u8 {
        self.padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{
        AddressAttribute, ChangeRequest, Fingerprint, MessageIntegrity, Software,
        StunAttributeType,
    };
    use crate::message::{MessageClass, StunMessageBuilder};
    use crate::methods::{BINDING, SHARED_SECRET};
    use crate::raw::HEADER_SIZE;
    use std::net::SocketAddr;
    use std::str::FromStr;

    const TRANSACTION_ID: [u8; 12] = [
        0xb7, 0xe7, 0xa7, 0x01, 0xbc, 0x34, 0xd6, 0x86, 0xfa, 0x87, 0xdf, 0xae,
    ];

    fn header(msg_type: u16, length: u16, cookie: u32) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(HEADER_SIZE);
        buffer.extend_from_slice(&msg_type.to_be_bytes());
        buffer.extend_from_slice(&length.to_be_bytes());
        buffer.extend_from_slice(&cookie.to_be_bytes());
        buffer.extend_from_slice(&TRANSACTION_ID);
        buffer
    }

    #[test]
    fn decode_leading_bits() {
        let buffer = header(0x8001, 0, 0x2112_a442);
        let decoder = MessageDecoder::default();
        assert_eq!(
            decoder.decode(&buffer).expect_err("Error expected"),
            StunErrorType::InvalidHeader
        );
    }

    #[test]
    fn decode_unknown_and_software() {
        let mut buffer = header(0x0001, 20, 0x2112_a442);
        buffer.extend_from_slice(&[
            0x99, 0x99, 0x00, 0x06, // Unknown comprehension-optional attribute
            0x01, 0x02, 0x03, 0x04, // }
            0x05, 0x06, 0x00, 0x00, // }
            0x80, 0x22, 0x00, 0x02, // SOFTWARE
            0x68, 0x69, 0x00, 0x00, // }
        ]);
        let decoder = MessageDecoder::default();
        let (msg, size) = decoder.decode(&buffer).expect("Can not decode message");
        assert_eq!(size, 40);
        assert_eq!(msg.attributes().len(), 2);

        let unknown = msg.attributes()[0].expect_unknown();
        assert_eq!(unknown.attribute_type(), AttributeType::from(0x9999));
        assert_eq!(unknown.value(), &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert_eq!(msg.attributes()[1].expect_software(), "hi");
        assert!(msg.unknown_comprehension_required().is_empty());
    }

    #[test]
    fn decode_drops_duplicates() {
        let mut buffer = header(0x0001, 16, 0x2112_a442);
        buffer.extend_from_slice(&[
            0x80, 0x22, 0x00, 0x01, // SOFTWARE
            0x61, 0x00, 0x00, 0x00, // }
            0x80, 0x22, 0x00, 0x01, // SOFTWARE
            0x62, 0x00, 0x00, 0x00, // }
        ]);
        let (msg, _) = MessageDecoder::default()
            .decode(&buffer)
            .expect("Can not decode message");
        assert_eq!(msg.attributes().len(), 1);
        assert_eq!(msg.attributes()[0].expect_software(), "a");
    }

    #[test]
    fn decode_ignores_trailing_attributes() {
        let mut buffer = header(0x0001, 40, 0x2112_a442);
        buffer.extend_from_slice(&[0x00, 0x08, 0x00, 0x14]);
        buffer.extend_from_slice(&[0xaa; 20]);
        buffer.extend_from_slice(&[
            0x80, 0x22, 0x00, 0x01, // SOFTWARE after MESSAGE-INTEGRITY
            0x61, 0x00, 0x00, 0x00, // }
            0x80, 0x28, 0x00, 0x04, // FINGERPRINT
            0x00, 0x00, 0x00, 0x00, // } not validated
        ]);

        let (msg, _) = MessageDecoder::default()
            .decode(&buffer)
            .expect("Can not decode message");
        assert_eq!(msg.attributes().len(), 2);
        assert!(msg.contains(AttributeType::MESSAGE_INTEGRITY));
        assert!(msg.contains(AttributeType::FINGERPRINT));
        assert!(!msg.contains(AttributeType::SOFTWARE));

        let ctx = DecoderContextBuilder::default()
            .with_trailing_attributes()
            .build();
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        let (msg, _) = decoder.decode(&buffer).expect("Can not decode message");
        assert_eq!(msg.attributes().len(), 3);
        assert!(msg.contains(AttributeType::SOFTWARE));
    }

    #[test]
    fn decode_with_fixed_dialect() {
        // OTHER-ADDRESS is not part of RFC 5389
        let mut buffer = header(0x0101, 12, 0x2112_a442);
        buffer.extend_from_slice(&[
            0x80, 0x2c, 0x00, 0x08, // OTHER-ADDRESS
            0x00, 0x01, 0x0d, 0x97, // }
            0xc0, 0x00, 0x02, 0x02, // }
        ]);

        let (msg, _) = MessageDecoder::default()
            .decode(&buffer)
            .expect("Can not decode message");
        assert_eq!(
            msg.other_address(),
            Some(SocketAddr::from_str("192.0.2.2:3479").expect("Can not parse address"))
        );

        let ctx = DecoderContextBuilder::default()
            .with_dialect(Dialect::Rfc5389)
            .build();
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        let (msg, _) = decoder.decode(&buffer).expect("Can not decode message");
        assert!(msg.other_address().is_none());
        assert!(msg.attributes()[0].is_unknown());
    }

    #[test]
    fn decode_dialect_from_cookie() {
        // Shared secret error response from a classic server
        let buffer = header(0x0112, 0, 0x0102_0304);
        let (msg, _) = MessageDecoder::default()
            .decode(&buffer)
            .expect("Can not decode message");
        assert_eq!(msg.method(), SHARED_SECRET);
        assert!(!msg.has_magic_cookie());

        // Classic STUN has no indications
        let buffer = header(0x0011, 0, 0x0102_0304);
        assert_eq!(
            MessageDecoder::default()
                .decode(&buffer)
                .expect_err("Error expected"),
            StunErrorType::UnsupportedMessage
        );

        let ctx = DecoderContextBuilder::default()
            .with_dialect(Dialect::Rfc5389)
            .build();
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        let buffer = header(0x0112, 0, 0x2112_a442);
        assert_eq!(
            decoder.decode(&buffer).expect_err("Error expected"),
            StunErrorType::UnsupportedMessage
        );
    }

    #[test]
    fn decode_bad_attribute() {
        // XOR-MAPPED-ADDRESS with an unknown family
        let mut buffer = header(0x0101, 12, 0x2112_a442);
        buffer.extend_from_slice(&[
            0x80, 0x22, 0x00, 0x00, // empty SOFTWARE
            0x00, 0x20, 0x00, 0x04, // XOR-MAPPED-ADDRESS
            0x00, 0x03, 0x00, 0x00, // }
        ]);
        let error = MessageDecoder::default()
            .decode(&buffer)
            .expect_err("Error expected");
        assert_eq!(error, StunErrorType::UnknownAddressFamily);
        match error.0 {
            StunErrorLevel::Attribute(e) => {
                assert_eq!(e.attr_type, Some(AttributeType::XOR_MAPPED_ADDRESS));
                assert_eq!(e.position, 1);
            }
            StunErrorLevel::Message(_) => panic!("Attribute level error expected"),
        }
    }

    #[test]
    fn encode_message() {
        let addr = SocketAddr::from_str("192.0.2.1:32853").expect("Can not parse address");
        let msg = StunMessageBuilder::new(BINDING, MessageClass::SuccessResponse)
            .with_transaction_id(TransactionId::from(TRANSACTION_ID))
            .with_attribute(AddressAttribute::xor_mapped_address(addr))
            .build();

        let encoder = MessageEncoder::default();
        let buffer = encoder.encode_to_vec(&msg).expect("Can not encode message");
        let mut expected = header(0x0101, 12, 0x2112_a442);
        expected.extend_from_slice(&[
            0x00, 0x20, 0x00, 0x08, // XOR-MAPPED-ADDRESS
            0x00, 0x01, 0xa1, 0x47, // }
            0xe1, 0x12, 0xa6, 0x43, // }
        ]);
        assert_eq!(buffer, expected);

        let (decoded, size) = MessageDecoder::default()
            .decode(&buffer)
            .expect("Can not decode message");
        assert_eq!(size, buffer.len());
        assert_eq!(decoded, msg);
    }

    #[test]
    fn encode_small_buffer() {
        let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
            .with_attribute(ChangeRequest::new(true, true))
            .build();
        let mut buffer = [0u8; 27];
        assert_eq!(
            MessageEncoder::default()
                .encode(&mut buffer, &msg)
                .expect_err("Error expected"),
            StunErrorType::OutOfRange
        );
    }

    #[test]
    fn encode_custom_padding() {
        let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
            .with_transaction_id(TransactionId::from(TRANSACTION_ID))
            .with_attribute(Software::new("abc").expect("Can not create SOFTWARE"))
            .build();
        let encoder = MessageEncoderBuilder::default().with_padding(0x20).build();
        assert_eq!(encoder.padding(), 0x20);
        let buffer = encoder.encode_to_vec(&msg).expect("Can not encode message");
        assert_eq!(&buffer[2..4], &[0x00, 0x08]);
        assert_eq!(&buffer[24..], &[0x61, 0x62, 0x63, 0x20]);
    }

    #[test]
    fn validate_integrity_and_fingerprint() {
        let key = HMACKey::new_short_term("secret").expect("Can not create key");
        let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
            .with_attribute(Software::new("client").expect("Can not create SOFTWARE"))
            .with_attribute(MessageIntegrity::new(key.clone()))
            .with_attribute(Fingerprint::default())
            .build();
        let mut buffer = MessageEncoder::default()
            .encode_to_vec(&msg)
            .expect("Can not encode message");

        let ctx = DecoderContextBuilder::default()
            .with_key(key)
            .with_validation()
            .build();
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        let (decoded, _) = decoder.decode(&buffer).expect("Can not decode message");
        assert_eq!(decoded.attributes().len(), 3);

        // Wrong key
        let ctx = DecoderContextBuilder::default()
            .with_key(HMACKey::new_short_term("other").expect("Can not create key"))
            .with_validation()
            .build();
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        assert_eq!(
            decoder.decode(&buffer).expect_err("Error expected"),
            StunErrorType::ValidationFailed
        );

        // Corrupted fingerprint, only detected when validating
        let last = buffer.len() - 1;
        buffer[last] ^= 0xff;
        assert!(MessageDecoder::default().decode(&buffer).is_ok());
        let ctx = DecoderContextBuilder::default().with_validation().build();
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        assert_eq!(
            decoder.decode(&buffer).expect_err("Error expected"),
            StunErrorType::ValidationFailed
        );
    }
}
