use crate::attributes::{stun_attribute, AsVerifiable, DecodeAttributeValue, EncodeAttributeValue};
use crate::context::AttributeContext;
use crate::cursor::{BitCursor, BitWriter};
use crate::error::{StunError, StunErrorType};

const RESPONSE_PORT_SIZE: usize = 4;

/// The `RESPONSE-PORT` attribute contains a port. It is a 16-bit unsigned integer in
/// network byte order followed by 2 bytes of padding. Values declared with a length of
/// 2 bytes, as sent by some implementations, are accepted too.
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           Port                |    padding                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponsePort(u16);

impl ResponsePort {
    /// Creates a new attribute
    pub fn new(port: u16) -> Self {
        Self(port)
    }

    /// Returns the port
    pub fn port(&self) -> u16 {
        self.0
    }
}

impl DecodeAttributeValue for ResponsePort {
    fn decode(_ctx: &AttributeContext, cursor: &mut BitCursor) -> Result<Self, StunError> {
        let size = cursor.remaining_bytes();
        if size != 2 && size != RESPONSE_PORT_SIZE {
            return Err(StunError::new(
                StunErrorType::MalformedAttribute,
                format!("RESPONSE-PORT requires 2 or 4 bytes, declared {}", size),
            ));
        }
        let port = cursor.read_u16()?;
        cursor.read_remaining()?;
        Ok(Self(port))
    }
}

impl EncodeAttributeValue for ResponsePort {
    fn value_size(&self) -> usize {
        RESPONSE_PORT_SIZE
    }

    fn encode(&self, _ctx: &AttributeContext, writer: &mut BitWriter) -> Result<(), StunError> {
        writer.write_u16(self.0)?;
        writer.write_u16(0)
    }
}

impl AsVerifiable for ResponsePort {}

stun_attribute!(ResponsePort, RESPONSE_PORT);
