use crate::attributes::{
    stun_attribute, AsVerifiable, DecodeAttributeValue, EncodeAttributeValue,
};
use crate::context::AttributeContext;
use crate::cursor::{BitCursor, BitWriter};
use crate::error::{StunError, StunErrorType};
use enumflags2::{bitflags, BitFlags};

const CHANGE_REQUEST_SIZE: usize = 4;

/// Flags of the [`ChangeRequest`] attribute
#[bitflags]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChangeRequestFlags {
    /// Ask the server to respond from a different port
    ChangePort = 1 << 1,
    /// Ask the server to respond from a different IP address
    ChangeIp = 1 << 2,
}

/// The `CHANGE-REQUEST` attribute contains two flags to control the IP address and port
/// that the server uses to send the response. RFC 3489 and RFC 5780 share its wire type
/// and layout.
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 A B 0|
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
/// # Examples
///```rust
/// # use stun_proto::attributes::ChangeRequest;
/// let attr = ChangeRequest::new(true, false);
/// assert!(attr.change_ip());
/// assert!(!attr.change_port());
///```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeRequest(BitFlags<ChangeRequestFlags>);

impl ChangeRequest {
    /// Creates a new `CHANGE-REQUEST` attribute
    pub fn new(change_ip: bool, change_port: bool) -> Self {
        let mut flags = BitFlags::empty();
        if change_ip {
            flags |= ChangeRequestFlags::ChangeIp;
        }
        if change_port {
            flags |= ChangeRequestFlags::ChangePort;
        }
        Self(flags)
    }

    /// Returns `true` if the server is asked to change its IP address
    pub fn change_ip(&self) -> bool {
        self.0.contains(ChangeRequestFlags::ChangeIp)
    }

    /// Returns `true` if the server is asked to change its port
    pub fn change_port(&self) -> bool {
        self.0.contains(ChangeRequestFlags::ChangePort)
    }

    /// Returns the flags
    pub fn flags(&self) -> BitFlags<ChangeRequestFlags> {
        self.0
    }
}

impl From<BitFlags<ChangeRequestFlags>> for ChangeRequest {
    fn from(flags: BitFlags<ChangeRequestFlags>) -> Self {
        Self(flags)
    }
}

impl DecodeAttributeValue for ChangeRequest {
    fn decode(_ctx: &AttributeContext, cursor: &mut BitCursor) -> Result<Self, StunError> {
        if cursor.remaining_bytes() != CHANGE_REQUEST_SIZE {
            return Err(StunError::new(
                StunErrorType::MalformedAttribute,
                format!(
                    "CHANGE-REQUEST requires {} bytes, declared {}",
                    CHANGE_REQUEST_SIZE,
                    cursor.remaining_bytes()
                ),
            ));
        }
        // Unassigned bits are ignored
        let flags = BitFlags::<ChangeRequestFlags>::from_bits_truncate(cursor.read_u32()?);
        Ok(Self(flags))
    }
}

impl EncodeAttributeValue for ChangeRequest {
    fn value_size(&self) -> usize {
        CHANGE_REQUEST_SIZE
    }

    fn encode(&self, _ctx: &AttributeContext, writer: &mut BitWriter) -> Result<(), StunError> {
        writer.write_u32(self.0.bits())
    }
}

impl AsVerifiable for ChangeRequest {}

stun_attribute!(ChangeRequest, CHANGE_REQUEST);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransactionId, MAGIC_COOKIE};

    fn context() -> AttributeContext {
        AttributeContext {
            cookie: MAGIC_COOKIE,
            transaction_id: TransactionId::default(),
        }
    }

    #[test]
    fn decode_change_request() {
        let ctx = context();

        let buffer = [0x00, 0x00, 0x00, 0x06];
        let mut cursor = BitCursor::new(&buffer);
        let attr = ChangeRequest::decode(&ctx, &mut cursor).expect("Can not decode CHANGE-REQUEST");
        assert!(attr.change_ip());
        assert!(attr.change_port());

        let buffer = [0x00, 0x00, 0x00, 0x02];
        let mut cursor = BitCursor::new(&buffer);
        let attr = ChangeRequest::decode(&ctx, &mut cursor).expect("Can not decode CHANGE-REQUEST");
        assert!(!attr.change_ip());
        assert!(attr.change_port());

        // Unknown bits are dropped
        let buffer = [0xff, 0x00, 0x00, 0x05];
        let mut cursor = BitCursor::new(&buffer);
        let attr = ChangeRequest::decode(&ctx, &mut cursor).expect("Can not decode CHANGE-REQUEST");
        assert_eq!(attr, ChangeRequest::new(true, false));
    }

    #[test]
    fn decode_change_request_bad_size() {
        let ctx = context();
        let buffer = [0x00, 0x00, 0x06];
        let mut cursor = BitCursor::new(&buffer);
        assert_eq!(
            ChangeRequest::decode(&ctx, &mut cursor).expect_err("Error expected"),
            StunErrorType::MalformedAttribute
        );

        let buffer = [0x00, 0x00, 0x00, 0x06, 0x00];
        let mut cursor = BitCursor::new(&buffer);
        assert_eq!(
            ChangeRequest::decode(&ctx, &mut cursor).expect_err("Error expected"),
            StunErrorType::MalformedAttribute
        );
    }

    #[test]
    fn encode_change_request() {
        let ctx = context();
        for (ip, port, expected) in [
            (false, false, 0x00),
            (false, true, 0x02),
            (true, false, 0x04),
            (true, true, 0x06),
        ] {
            let attr = ChangeRequest::new(ip, port);
            let mut buffer = [0xffu8; 4];
            let mut writer = BitWriter::new(&mut buffer);
            attr.encode(&ctx, &mut writer)
                .expect("Can not encode CHANGE-REQUEST");
            assert_eq!(buffer, [0x00, 0x00, 0x00, expected]);
        }
    }
}
