use crate::attributes::ATTRIBUTE_HEADER_SIZE;
use crate::common::padding;
use crate::cursor::BitCursor;
use crate::error::{StunError, StunErrorType};
use crate::types::{Cookie, TransactionId, TRANSACTION_ID_SIZE};
use fallible_iterator::FallibleIterator;

// Stun message format
//       0                   1                   2                   3
//       0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//      |0 0|     STUN Message Type     |         Message Length        |
//      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//      |                         Magic Cookie                          |
//      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//      |                                                               |
//      |                     Transaction ID (96 bits)                  |
//      |                                                               |
//      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

/// Size of the STUN header
pub const HEADER_SIZE: usize = 20;
pub(crate) const LENGTH_OFFSET: usize = 2;

const LEADING_BITS: (usize, usize) = (0, 2);
const TYPE_BITS: (usize, usize) = (2, 14);
const LENGTH_BITS: (usize, usize) = (16, 16);
const COOKIE_BITS: (usize, usize) = (32, 32);
const TRANSACTION_ID_BITS: (usize, usize) = (64, 96);

fn malformed<S: Into<String>>(msg: S) -> StunError {
    StunError::new(StunErrorType::MalformedMessage, msg)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MessageHeader {
    pub leading_bits: u8,
    pub msg_type: u16,
    pub msg_length: u16,
    pub cookie: Cookie,
    pub transaction_id: TransactionId,
}

impl MessageHeader {
    pub fn decode(buffer: &[u8]) -> Result<Self, StunError> {
        if buffer.len() < HEADER_SIZE {
            return Err(malformed(format!(
                "Header requires {} bytes, buffer size: {}",
                HEADER_SIZE,
                buffer.len()
            )));
        }

        let cursor = BitCursor::new(&buffer[..HEADER_SIZE]);
        let field = |(offset, width): (usize, usize)| cursor.read_bits_at(offset, width);

        // Field widths guarantee the narrowing casts below are lossless
        let leading_bits = field(LEADING_BITS)? as u8;
        let msg_type = field(TYPE_BITS)? as u16;
        let msg_length = field(LENGTH_BITS)? as u16;
        let cookie = Cookie::new(field(COOKIE_BITS)? as u32);

        let tid = field(TRANSACTION_ID_BITS)?.to_be_bytes();
        let mut transaction_id = [0u8; TRANSACTION_ID_SIZE];
        transaction_id.copy_from_slice(&tid[16 - TRANSACTION_ID_SIZE..]);

        Ok(Self {
            leading_bits,
            msg_type,
            msg_length,
            cookie,
            transaction_id: TransactionId::from(transaction_id),
        })
    }
}

/// Returns the total size of the STUN message whose header starts `buffer`, or an error
/// if the header is incomplete or declares a length that is not a multiple of 4. Stream
/// transports use it to frame messages.
pub fn message_size(buffer: &[u8]) -> Result<usize, StunError> {
    let header = MessageHeader::decode(buffer)?;
    if header.msg_length % 4 != 0 {
        return Err(malformed(format!(
            "Message length {} is not a multiple of 4",
            header.msg_length
        )));
    }
    Ok(HEADER_SIZE + usize::from(header.msg_length))
}

#[derive(Debug)]
pub(crate) struct RawMessage<'a> {
    pub header: MessageHeader,
    pub attributes: &'a [u8],
}

impl<'a> RawMessage<'a> {
    pub fn decode(buffer: &'a [u8]) -> Result<Self, StunError> {
        let size = message_size(buffer)?;
        if buffer.len() < size {
            return Err(malformed(format!(
                "Message requires {} bytes, buffer size: {}",
                size,
                buffer.len()
            )));
        }
        let header = MessageHeader::decode(buffer)?;
        Ok(Self {
            header,
            attributes: &buffer[HEADER_SIZE..size],
        })
    }

    pub fn size(&self) -> usize {
        HEADER_SIZE + self.attributes.len()
    }

    pub fn attributes(&self) -> RawAttributesIter<'a> {
        RawAttributesIter {
            cursor: BitCursor::new(self.attributes),
        }
    }
}

// Format of STUN Attributes:
//      0                   1                   2                   3
//      0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//     |         Type                  |            Length             |
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//     |                         Value (variable)                ....
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RawAttribute<'a> {
    pub attr_type: u16,
    pub value: &'a [u8],
    /// Offset of the attribute header from the start of the message
    pub offset: usize,
}

#[derive(Debug)]
pub(crate) struct RawAttributesIter<'a> {
    cursor: BitCursor<'a>,
}

impl<'a> FallibleIterator for RawAttributesIter<'a> {
    type Item = RawAttribute<'a>;
    type Error = StunError;

    fn next(&mut self) -> Result<Option<Self::Item>, Self::Error> {
        if self.cursor.is_empty() {
            return Ok(None);
        }

        let offset = HEADER_SIZE + self.cursor.byte_position();
        if self.cursor.remaining_bytes() < ATTRIBUTE_HEADER_SIZE {
            return Err(malformed(format!(
                "Truncated attribute header at offset {}",
                offset
            )));
        }
        let attr_type = self.cursor.read_u16()?;
        let length = usize::from(self.cursor.read_u16()?);

        let padded = length + padding(length);
        if self.cursor.remaining_bytes() < padded {
            return Err(malformed(format!(
                "Attribute 0x{:04X} at offset {} declares {} bytes, {} left",
                attr_type,
                offset,
                padded,
                self.cursor.remaining_bytes()
            )));
        }
        let value = self.cursor.read_bytes(length)?;
        self.cursor.skip_bytes(padding(length))?;

        Ok(Some(RawAttribute {
            attr_type,
            value,
            offset,
        }))
    }
}
