//! Attribute table of Session Traversal Utilities for NAT, RFC 5389.

use crate::attributes::error_code::RFC5389_ERROR_CLASSES;
use crate::attributes::{
    AddressAttribute, AddressRole, AttributeType, DecodeAttributeValue, ErrorCode, Fingerprint,
    MessageIntegrity, Nonce, Realm, Software, StunAttribute, UnknownAttributes, UserName,
};
use crate::context::AttributeContext;
use crate::cursor::BitCursor;
use crate::error::StunError;

/// Attribute types defined by RFC 5389
pub const ATTRIBUTES: &[AttributeType] = &[
    AttributeType::MAPPED_ADDRESS,
    AttributeType::USER_NAME,
    AttributeType::MESSAGE_INTEGRITY,
    AttributeType::ERROR_CODE,
    AttributeType::UNKNOWN_ATTRIBUTES,
    AttributeType::REALM,
    AttributeType::NONCE,
    AttributeType::XOR_MAPPED_ADDRESS,
    AttributeType::SOFTWARE,
    AttributeType::ALTERNATE_SERVER,
    AttributeType::FINGERPRINT,
];

/// Returns `true` if RFC 5389 defines `attr_type`
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
        AttributeType::MAPPED_ADDRESS => {
            AddressAttribute::decode(AddressRole::MappedAddress, ctx, cursor)?.into()
        }
        AttributeType::XOR_MAPPED_ADDRESS => {
            AddressAttribute::decode(AddressRole::XorMappedAddress, ctx, cursor)?.into()
        }
        AttributeType::ALTERNATE_SERVER => {
            AddressAttribute::decode(AddressRole::AlternateServer, ctx, cursor)?.into()
        }
        AttributeType::USER_NAME => UserName::decode(ctx, cursor)?.into(),
        AttributeType::MESSAGE_INTEGRITY => MessageIntegrity::decode(cursor)?.into(),
        AttributeType::ERROR_CODE => ErrorCode::decode(cursor, RFC5389_ERROR_CLASSES)?.into(),
        AttributeType::UNKNOWN_ATTRIBUTES => UnknownAttributes::decode(ctx, cursor)?.into(),
        AttributeType::REALM => Realm::decode(ctx, cursor)?.into(),
        AttributeType::NONCE => Nonce::decode(ctx, cursor)?.into(),
        AttributeType::SOFTWARE => Software::decode(ctx, cursor)?.into(),
        AttributeType::FINGERPRINT => Fingerprint::decode(cursor)?.into(),
        _ => return Ok(None),
    };
    Ok(Some(attr))
}
