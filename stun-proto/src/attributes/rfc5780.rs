//! Attribute table of NAT Behavior Discovery Using STUN, RFC 5780.

use crate::attributes::{
    AddressAttribute, AddressRole, AttributeType, ChangeRequest, DecodeAttributeValue, Padding,
    ResponsePort, StunAttribute,
};
use crate::context::AttributeContext;
use crate::cursor::BitCursor;
use crate::error::StunError;

/// Attribute types defined by RFC 5780
pub const ATTRIBUTES: &[AttributeType] = &[
    AttributeType::CHANGE_REQUEST,
    AttributeType::PADDING,
    AttributeType::RESPONSE_PORT,
    AttributeType::RESPONSE_ORIGIN,
    AttributeType::OTHER_ADDRESS,
];

/// Returns `true` if RFC 5780 defines `attr_type`
pub fn is_known(attr_type: AttributeType) -> bool {
    ATTRIBUTES.contains(&attr_type)
}

/// Decodes `attr_type` from a cursor spanning its declared length. Returns `None` if the
/// type is not part of this table.
pub(crate) fn decode(
    ctx: &AttributeContext,
    attr_type: AttributeType,
    cursor: &mut BitCursor,
) -> Result<Option<StunAttribute>, StunError> {
    let attr = match attr_type {
        AttributeType::CHANGE_REQUEST => ChangeRequest::decode(ctx, cursor)?.into(),
        AttributeType::PADDING => Padding::decode(ctx, cursor)?.into(),
        AttributeType::RESPONSE_PORT => ResponsePort::decode(ctx, cursor)?.into(),
        AttributeType::RESPONSE_ORIGIN => {
            AddressAttribute::decode(AddressRole::ResponseOrigin, ctx, cursor)?.into()
        }
        AttributeType::OTHER_ADDRESS => {
            AddressAttribute::decode(AddressRole::OtherAddress, ctx, cursor)?.into()
        }
        _ => return Ok(None),
    };
    Ok(Some(attr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransactionId, MAGIC_COOKIE};
    use std::net::SocketAddr;
    use std::str::FromStr;

    fn context() -> AttributeContext {
        AttributeContext {
            cookie: MAGIC_COOKIE,
            transaction_id: TransactionId::default(),
        }
    }

    #[test]
    fn decode_other_address() {
        // OTHER-ADDRESS is not obfuscated
        let buffer = [0x00, 0x01, 0x0d, 0x97, 0xc0, 0x00, 0x02, 0x02];
        let mut cursor = BitCursor::new(&buffer);
        let attr = decode(&context(), AttributeType::OTHER_ADDRESS, &mut cursor)
            .expect("Can not decode OTHER-ADDRESS")
            .expect("OTHER-ADDRESS not recognized");
        let addr = attr.expect_address();
        assert_eq!(addr.role(), AddressRole::OtherAddress);
        assert_eq!(
            addr.address(),
            SocketAddr::from_str("192.0.2.2:3479").expect("Can not parse address")
        );
    }

    #[test]
    fn decode_change_request() {
        let buffer = [0x00, 0x00, 0x00, 0x04];
        let mut cursor = BitCursor::new(&buffer);
        let attr = decode(&context(), AttributeType::CHANGE_REQUEST, &mut cursor)
            .expect("Can not decode CHANGE-REQUEST")
            .expect("CHANGE-REQUEST not recognized");
        assert_eq!(attr.expect_change_request(), &ChangeRequest::new(true, false));
    }

    #[test]
    fn unrecognized_types() {
        let buffer = [0x00, 0x01, 0x0d, 0x97, 0xc0, 0x00, 0x02, 0x02];
        for attr_type in [
            AttributeType::MAPPED_ADDRESS,
            AttributeType::XOR_MAPPED_ADDRESS,
            AttributeType::CHANGED_ADDRESS,
            AttributeType::SOFTWARE,
        ] {
            let mut cursor = BitCursor::new(&buffer);
            assert!(decode(&context(), attr_type, &mut cursor)
                .expect("Unexpected error")
                .is_none());
            assert!(!is_known(attr_type));
        }
    }
}
