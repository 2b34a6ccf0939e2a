use crate::attributes::{
    stun_attribute, AsVerifiable, EncodeAttributeValue, Verifiable, ATTRIBUTE_HEADER_SIZE,
};
use crate::context::{AttributeContext, DecoderContext};
use crate::cursor::{BitCursor, BitWriter};
use crate::error::{StunError, StunErrorType};
use crate::raw::{HEADER_SIZE, LENGTH_OFFSET};
use crate::types::HMACKey;
use byteorder::{BigEndian, ByteOrder};
use std::convert::TryFrom;

const MESSAGE_INTEGRITY_SIZE: usize = 20;
const FINGERPRINT_SIZE: usize = 4;
const FINGERPRINT_XOR_VALUE: u32 = 0x5354_554e;

fn check_size(cursor: &BitCursor, expected: usize, name: &str) -> Result<(), StunError> {
    if cursor.remaining_bytes() != expected {
        return Err(StunError::new(
            StunErrorType::MalformedAttribute,
            format!(
                "{} requires {} bytes, declared {}",
                name,
                expected,
                cursor.remaining_bytes()
            ),
        ));
    }
    Ok(())
}

/// Copies the bytes preceding an attribute that starts at `offset`, rewriting the header
/// length so that the message ends right after an attribute of `value_size` bytes.
pub(crate) fn patched_prefix(
    buffer: &[u8],
    offset: usize,
    value_size: usize,
) -> Result<Vec<u8>, StunError> {
    if offset < HEADER_SIZE || offset > buffer.len() {
        return Err(StunError::new(
            StunErrorType::OutOfRange,
            format!("Attribute offset {} outside of message", offset),
        ));
    }
    let length = u16::try_from(offset + ATTRIBUTE_HEADER_SIZE + value_size - HEADER_SIZE)?;
    let mut input = buffer[..offset].to_vec();
    BigEndian::write_u16(&mut input[LENGTH_OFFSET..LENGTH_OFFSET + 2], length);
    Ok(input)
}

// Rewrites the header length in place and returns the offset where the attribute header
// being encoded starts.
fn patch_length(writer: &mut BitWriter, value_size: usize) -> Result<usize, StunError> {
    let start = writer
        .byte_position()
        .checked_sub(ATTRIBUTE_HEADER_SIZE)
        .filter(|start| *start >= HEADER_SIZE)
        .ok_or_else(|| {
            StunError::new(
                StunErrorType::InvalidParam,
                "Attribute must be encoded inside a message",
            )
        })?;
    let length = u16::try_from(writer.byte_position() + value_size - HEADER_SIZE)?;
    writer.write_u16_at(LENGTH_OFFSET, length)?;
    Ok(start)
}

/// The `MESSAGE-INTEGRITY` attribute contains an HMAC-SHA1 of the STUN message, computed
/// over every byte preceding the attribute with the header length covering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageIntegrity {
    /// Attribute to be encoded, the HMAC is computed with this key
    Encodable(HMACKey),
    /// Attribute decoded from the wire
    Decodable([u8; MESSAGE_INTEGRITY_SIZE]),
}

impl MessageIntegrity {
    /// Creates a `MESSAGE-INTEGRITY` attribute that is computed with `key` when encoded
    pub fn new(key: HMACKey) -> Self {
        MessageIntegrity::Encodable(key)
    }

    /// Returns the HMAC carried by a decoded attribute
    pub fn hmac(&self) -> Option<&[u8; MESSAGE_INTEGRITY_SIZE]> {
        match self {
            MessageIntegrity::Encodable(_) => None,
            MessageIntegrity::Decodable(hmac) => Some(hmac),
        }
    }

    pub(crate) fn decode(cursor: &mut BitCursor) -> Result<Self, StunError> {
        check_size(cursor, MESSAGE_INTEGRITY_SIZE, "MESSAGE-INTEGRITY")?;
        let mut hmac = [0u8; MESSAGE_INTEGRITY_SIZE];
        hmac.copy_from_slice(cursor.read_bytes(MESSAGE_INTEGRITY_SIZE)?);
        Ok(MessageIntegrity::Decodable(hmac))
    }

    fn validate(&self, input: &[u8], key: &HMACKey) -> bool {
        match self {
            MessageIntegrity::Encodable(_) => false,
            MessageIntegrity::Decodable(hmac) => {
                hmac_sha1::hmac_sha1(key.as_bytes(), input) == *hmac
            }
        }
    }
}

impl EncodeAttributeValue for MessageIntegrity {
    fn value_size(&self) -> usize {
        MESSAGE_INTEGRITY_SIZE
    }

    fn encode(&self, _ctx: &AttributeContext, writer: &mut BitWriter) -> Result<(), StunError> {
        let start = patch_length(writer, MESSAGE_INTEGRITY_SIZE)?;
        let hmac = match self {
            MessageIntegrity::Encodable(key) => {
                hmac_sha1::hmac_sha1(key.as_bytes(), &writer.written()[..start])
            }
            MessageIntegrity::Decodable(hmac) => *hmac,
        };
        writer.write_bytes(&hmac)
    }
}

impl Verifiable for MessageIntegrity {
    fn verify(&self, input: &[u8], ctx: &DecoderContext) -> bool {
        // Nothing to check against without credentials
        match ctx.key() {
            Some(key) => self.validate(input, key),
            None => true,
        }
    }
}

impl AsVerifiable for MessageIntegrity {
    fn as_verifiable_ref(&self) -> Option<&dyn Verifiable> {
        Some(self)
    }
}

stun_attribute!(MessageIntegrity, MESSAGE_INTEGRITY);

/// The `FINGERPRINT` attribute carries the CRC-32 of the message up to the attribute,
/// XOR'ed with `0x5354554E`. It is always computed when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fingerprint {
    /// Attribute to be encoded
    #[default]
    Encodable,
    /// Attribute decoded from the wire
    Decodable(u32),
}

impl Fingerprint {
    /// Returns the value carried by a decoded attribute
    pub fn value(&self) -> Option<u32> {
        match self {
            Fingerprint::Encodable => None,
            Fingerprint::Decodable(value) => Some(*value),
        }
    }

    fn compute(input: &[u8]) -> u32 {
        let crc32 = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC).checksum(input);
        crc32 ^ FINGERPRINT_XOR_VALUE
    }

    pub(crate) fn decode(cursor: &mut BitCursor) -> Result<Self, StunError> {
        check_size(cursor, FINGERPRINT_SIZE, "FINGERPRINT")?;
        Ok(Fingerprint::Decodable(cursor.read_u32()?))
    }
}

impl EncodeAttributeValue for Fingerprint {
    fn value_size(&self) -> usize {
        FINGERPRINT_SIZE
    }

    fn encode(&self, _ctx: &AttributeContext, writer: &mut BitWriter) -> Result<(), StunError> {
        let start = patch_length(writer, FINGERPRINT_SIZE)?;
        let value = Fingerprint::compute(&writer.written()[..start]);
        writer.write_u32(value)
    }
}

impl Verifiable for Fingerprint {
    fn verify(&self, input: &[u8], _ctx: &DecoderContext) -> bool {
        match self {
            Fingerprint::Encodable => false,
            Fingerprint::Decodable(value) => Fingerprint::compute(input) == *value,
        }
    }
}

impl AsVerifiable for Fingerprint {
    fn as_verifiable_ref(&self) -> Option<&dyn Verifiable> {
        Some(self)
    }
}

stun_attribute!(Fingerprint, FINGERPRINT);
