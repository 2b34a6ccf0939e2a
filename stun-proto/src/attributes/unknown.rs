use crate::attributes::{
    stun_attribute, AsVerifiable, AttributeType, DecodeAttributeValue, EncodeAttributeValue,
    StunAttributeType,
};
use crate::context::AttributeContext;
use crate::cursor::{BitCursor, BitWriter};
use crate::error::{StunError, StunErrorType};

/// Attribute not recognized by the dialect used to decode it. The value is kept verbatim
/// so it can be inspected or encoded back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Unknown {
    attr_type: AttributeType,
    value: Vec<u8>,
}

impl Unknown {
    /// Creates an unknown attribute from its type and raw value
    pub fn new<T>(attr_type: AttributeType, value: T) -> Self
    where
        T: Into<Vec<u8>>,
    {
        Self {
            attr_type,
            value: value.into(),
        }
    }

    /// Returns the raw value, padding excluded
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

impl StunAttributeType for Unknown {
    fn attribute_type(&self) -> AttributeType {
        self.attr_type
    }
}

impl EncodeAttributeValue for Unknown {
    fn value_size(&self) -> usize {
        self.value.len()
    }

    fn encode(&self, _ctx: &AttributeContext, writer: &mut BitWriter) -> Result<(), StunError> {
        writer.write_bytes(&self.value)
    }
}

impl AsVerifiable for Unknown {}

/// The `UNKNOWN-ATTRIBUTES` attribute is present only in an error response when the
/// response code in the `ERROR-CODE` attribute is 420. It lists the comprehension
/// required attributes the server did not understand.
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      Attribute 1 Type           |     Attribute 2 Type        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      Attribute 3 Type           |     Attribute 4 Type    ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnknownAttributes(Vec<AttributeType>);

impl UnknownAttributes {
    /// Creates the attribute from the list of types
    pub fn new(attributes: Vec<AttributeType>) -> Self {
        Self(attributes)
    }

    /// Adds a type to the list
    pub fn add(&mut self, attr_type: AttributeType) {
        self.0.push(attr_type);
    }

    /// Returns the list of types, in wire order
    pub fn attributes(&self) -> &[AttributeType] {
        &self.0
    }
}

impl DecodeAttributeValue for UnknownAttributes {
    fn decode(_ctx: &AttributeContext, cursor: &mut BitCursor) -> Result<Self, StunError> {
        if cursor.remaining_bytes() % 2 != 0 {
            return Err(StunError::new(
                StunErrorType::MalformedAttribute,
                format!(
                    "UNKNOWN-ATTRIBUTES length {} is not a multiple of 2",
                    cursor.remaining_bytes()
                ),
            ));
        }
        let mut attributes = Vec::with_capacity(cursor.remaining_bytes() / 2);
        while !cursor.is_empty() {
            attributes.push(AttributeType::from(cursor.read_u16()?));
        }
        Ok(Self(attributes))
    }
}

impl EncodeAttributeValue for UnknownAttributes {
    fn value_size(&self) -> usize {
        self.0.len() * 2
    }

    fn encode(&self, _ctx: &AttributeContext, writer: &mut BitWriter) -> Result<(), StunError> {
        self.0
            .iter()
            .try_for_each(|attr_type| writer.write_u16(attr_type.as_u16()))
    }
}

impl AsVerifiable for UnknownAttributes {}

stun_attribute!(UnknownAttributes, UNKNOWN_ATTRIBUTES);

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
    fn decode_unknown_attributes() {
        let buffer = [0x00, 0x24, 0x80, 0x29, 0x00, 0x25];
        let mut cursor = BitCursor::new(&buffer);
        let attr = UnknownAttributes::decode(&context(), &mut cursor)
            .expect("Can not decode UNKNOWN-ATTRIBUTES");
        assert_eq!(
            attr.attributes(),
            &[
                AttributeType::from(0x0024),
                AttributeType::from(0x8029),
                AttributeType::from(0x0025)
            ]
        );

        let buffer = [0x00, 0x24, 0x80];
        let mut cursor = BitCursor::new(&buffer);
        assert_eq!(
            UnknownAttributes::decode(&context(), &mut cursor).expect_err("Error expected"),
            StunErrorType::MalformedAttribute
        );
    }

    #[test]
    fn encode_unknown_attributes() {
        let mut attr = UnknownAttributes::default();
        attr.add(AttributeType::from(0x0024));
        attr.add(AttributeType::from(0x8029));
        assert_eq!(attr.value_size(), 4);

        let mut buffer = [0u8; 4];
        let mut writer = BitWriter::new(&mut buffer);
        attr.encode(&context(), &mut writer)
            .expect("Can not encode UNKNOWN-ATTRIBUTES");
        assert_eq!(buffer, [0x00, 0x24, 0x80, 0x29]);
    }

    #[test]
    fn unknown_keeps_raw_value() {
        let attr = Unknown::new(AttributeType::from(0x9999), [1u8, 2, 3, 4, 5, 6]);
        assert_eq!(attr.attribute_type(), AttributeType::from(0x9999));
        assert_eq!(attr.value_size(), 6);

        let mut buffer = [0u8; 6];
        let mut writer = BitWriter::new(&mut buffer);
        attr.encode(&context(), &mut writer)
            .expect("Can not encode unknown attribute");
        assert_eq!(buffer, [1, 2, 3, 4, 5, 6]);
    }
}
