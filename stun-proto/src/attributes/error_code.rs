use crate::attributes::{stun_attribute, AsVerifiable, EncodeAttributeValue};
use crate::context::AttributeContext;
use crate::cursor::{BitCursor, BitWriter};
use crate::error::{StunError, StunErrorType};
use std::ops::RangeInclusive;

const ERROR_CODE_HEADER_SIZE: usize = 4;
const MAX_REASON_SIZE: usize = 763;

/// Error classes accepted by RFC 5389
pub(crate) const RFC5389_ERROR_CLASSES: RangeInclusive<u16> = 3..=6;
/// Error classes accepted by RFC 3489
pub(crate) const RFC3489_ERROR_CLASSES: RangeInclusive<u16> = 1..=6;

/// The `ERROR-CODE` attribute is used in error response messages. It contains a numeric
/// error code value in the range of 100 to 699 plus a textual reason phrase encoded in
/// UTF-8.
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           Reserved, should be 0         |Class|     Number    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      Reason Phrase (variable)                                ..
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
/// # Examples
///```rust
/// # use stun_proto::attributes::ErrorCode;
/// let attr = ErrorCode::new(420, "Unknown Attribute").unwrap();
/// assert_eq!(attr.class(), 4);
/// assert_eq!(attr.number(), 20);
/// assert_eq!(attr.reason(), "Unknown Attribute");
///```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    code: u16,
    reason: String,
}

impl ErrorCode {
    /// Creates an `ERROR-CODE` attribute. The code must lay in 100..=699.
    pub fn new<S>(code: u16, reason: S) -> Result<Self, StunError>
    where
        S: Into<String>,
    {
        if !(100..=699).contains(&code) {
            return Err(StunError::new(
                StunErrorType::InvalidParam,
                format!("Error code {} out of range 100..=699", code),
            ));
        }
        let reason = reason.into();
        if reason.len() > MAX_REASON_SIZE {
            return Err(StunError::new(
                StunErrorType::ValueTooLong,
                format!(
                    "Reason phrase of {} bytes exceeds {}",
                    reason.len(),
                    MAX_REASON_SIZE
                ),
            ));
        }
        Ok(Self { code, reason })
    }

    /// Returns the error code, `class * 100 + number`
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Returns the hundreds digit of the code
    pub fn class(&self) -> u16 {
        self.code / 100
    }

    /// Returns the code modulo 100
    pub fn number(&self) -> u16 {
        self.code % 100
    }

    /// Returns the reason phrase
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub(crate) fn decode(
        cursor: &mut BitCursor,
        classes: RangeInclusive<u16>,
    ) -> Result<Self, StunError> {
        if cursor.remaining_bytes() < ERROR_CODE_HEADER_SIZE {
            return Err(StunError::new(
                StunErrorType::MalformedAttribute,
                format!(
                    "ERROR-CODE requires at least {} bytes, declared {}",
                    ERROR_CODE_HEADER_SIZE,
                    cursor.remaining_bytes()
                ),
            ));
        }

        // Reserved
        cursor.read_bits(21)?;
        let class = cursor.read_bits(3)? as u16;
        let number = u16::from(cursor.read_u8()?);

        if !classes.contains(&class) || number > 99 {
            return Err(StunError::new(
                StunErrorType::MalformedAttribute,
                format!(
                    "Invalid error code: class {} (allowed {:?}), number {}",
                    class, classes, number
                ),
            ));
        }

        let raw_reason = cursor.read_remaining()?;
        if raw_reason.len() > MAX_REASON_SIZE {
            return Err(StunError::new(
                StunErrorType::ValueTooLong,
                format!(
                    "Reason phrase of {} bytes exceeds {}",
                    raw_reason.len(),
                    MAX_REASON_SIZE
                ),
            ));
        }
        let reason = std::str::from_utf8(raw_reason)?;

        Ok(Self {
            code: class * 100 + number,
            reason: reason.to_string(),
        })
    }
}

impl EncodeAttributeValue for ErrorCode {
    fn value_size(&self) -> usize {
        ERROR_CODE_HEADER_SIZE + self.reason.len()
    }

    fn encode(&self, _ctx: &AttributeContext, writer: &mut BitWriter) -> Result<(), StunError> {
        writer.write_bits(0, 21)?;
        writer.write_bits(u128::from(self.class()), 3)?;
        writer.write_u8(self.number() as u8)?;
        writer.write_bytes(self.reason.as_bytes())
    }
}

impl AsVerifiable for ErrorCode {}

stun_attribute!(ErrorCode, ERROR_CODE);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransactionId, MAGIC_COOKIE};

    #[test]
    fn decode_error_code() {
        let buffer = [
            0x00, 0x00, 0x04, 0x14, // }
            b'B', b'a', b'd', b' ', // }
        ];
        let mut cursor = BitCursor::new(&buffer);
        let attr = ErrorCode::decode(&mut cursor, RFC5389_ERROR_CLASSES)
            .expect("Can not decode ERROR-CODE");
        assert_eq!(attr.code(), 420);
        assert_eq!(attr.reason(), "Bad ");
        assert!(cursor.is_empty());

        // Reserved bits are ignored
        let buffer = [0xff, 0xff, 0xfb, 0x00];
        let mut cursor = BitCursor::new(&buffer);
        let attr = ErrorCode::decode(&mut cursor, RFC5389_ERROR_CLASSES)
            .expect("Can not decode ERROR-CODE");
        assert_eq!(attr.code(), 300);
        assert_eq!(attr.reason(), "");
    }

    #[test]
    fn decode_error_code_class_range() {
        // Class 1 is only valid for RFC 3489
        let buffer = [0x00, 0x00, 0x01, 0x00];
        let mut cursor = BitCursor::new(&buffer);
        assert_eq!(
            ErrorCode::decode(&mut cursor, RFC5389_ERROR_CLASSES).expect_err("Error expected"),
            StunErrorType::MalformedAttribute
        );

        let mut cursor = BitCursor::new(&buffer);
        let attr = ErrorCode::decode(&mut cursor, RFC3489_ERROR_CLASSES)
            .expect("Can not decode ERROR-CODE");
        assert_eq!(attr.code(), 100);

        // Class 7
        let buffer = [0x00, 0x00, 0x07, 0x00];
        let mut cursor = BitCursor::new(&buffer);
        assert_eq!(
            ErrorCode::decode(&mut cursor, RFC3489_ERROR_CLASSES).expect_err("Error expected"),
            StunErrorType::MalformedAttribute
        );

        // Number 100
        let buffer = [0x00, 0x00, 0x04, 0x64];
        let mut cursor = BitCursor::new(&buffer);
        assert_eq!(
            ErrorCode::decode(&mut cursor, RFC3489_ERROR_CLASSES).expect_err("Error expected"),
            StunErrorType::MalformedAttribute
        );
    }

    #[test]
    fn decode_error_code_malformed() {
        let buffer = [0x00, 0x00, 0x04];
        let mut cursor = BitCursor::new(&buffer);
        assert_eq!(
            ErrorCode::decode(&mut cursor, RFC5389_ERROR_CLASSES).expect_err("Error expected"),
            StunErrorType::MalformedAttribute
        );

        let buffer = [0x00, 0x00, 0x04, 0x14, 0xff, 0xfe];
        let mut cursor = BitCursor::new(&buffer);
        assert_eq!(
            ErrorCode::decode(&mut cursor, RFC5389_ERROR_CLASSES).expect_err("Error expected"),
            StunErrorType::MalformedAttribute
        );
    }

    #[test]
    fn encode_error_code() {
        let ctx = AttributeContext {
            cookie: MAGIC_COOKIE,
            transaction_id: TransactionId::default(),
        };
        let attr = ErrorCode::new(487, "Role Conflict").expect("Can not create ERROR-CODE");
        assert_eq!(attr.value_size(), 17);

        let mut buffer = [0u8; 17];
        let mut writer = BitWriter::new(&mut buffer);
        attr.encode(&ctx, &mut writer).expect("Can not encode ERROR-CODE");
        assert_eq!(&buffer[..4], &[0x00, 0x00, 0x04, 0x57]);
        assert_eq!(&buffer[4..], b"Role Conflict");

        assert_eq!(
            ErrorCode::new(99, "").expect_err("Error expected"),
            StunErrorType::InvalidParam
        );
        assert_eq!(
            ErrorCode::new(700, "").expect_err("Error expected"),
            StunErrorType::InvalidParam
        );
        assert_eq!(
            ErrorCode::new(400, "x".repeat(MAX_REASON_SIZE + 1)).expect_err("Error expected"),
            StunErrorType::ValueTooLong
        );
    }
}
