//! Attribute table of the classic STUN protocol, RFC 3489.

use crate::attributes::error_code::RFC3489_ERROR_CLASSES;
use crate::attributes::{
    AddressAttribute, AddressRole, AttributeType, ChangeRequest, DecodeAttributeValue, ErrorCode,
    MessageIntegrity, Password, StunAttribute, UnknownAttributes, UserName,
};
use crate::context::AttributeContext;
use crate::cursor::BitCursor;
use crate::error::StunError;

/// Attribute types defined by RFC 3489
pub const ATTRIBUTES: &[AttributeType] = &[
    AttributeType::MAPPED_ADDRESS,
    AttributeType::RESPONSE_ADDRESS,
    AttributeType::CHANGE_REQUEST,
    AttributeType::SOURCE_ADDRESS,
    AttributeType::CHANGED_ADDRESS,
    AttributeType::USER_NAME,
    AttributeType::PASSWORD,
    AttributeType::MESSAGE_INTEGRITY,
    AttributeType::ERROR_CODE,
    AttributeType::UNKNOWN_ATTRIBUTES,
    AttributeType::REFLECTED_FROM,
];

/// Returns `true` if RFC 3489 defines `attr_type`
pub fn is_known(attr_type: AttributeType) -> bool {
    ATTRIBUTES.contains(&attr_type)
}

fn address(
    role: AddressRole,
    ctx: &AttributeContext,
    cursor: &mut BitCursor,
) -> Result<StunAttribute, StunError> {
    Ok(AddressAttribute::decode(role, ctx, cursor)?.into())
}

/// Decodes `attr_type` from a cursor spanning its declared length. Returns `None` if the
/// type is not part of this table.
pub(crate) fn decode(
    ctx: &AttributeContext,
    attr_type: AttributeType,
    cursor: &mut BitCursor,
) -> Result<Option<StunAttribute>, StunError> {
    let attr = match attr_type {
        AttributeType::MAPPED_ADDRESS => address(AddressRole::MappedAddress, ctx, cursor)?,
        AttributeType::RESPONSE_ADDRESS => address(AddressRole::ResponseAddress, ctx, cursor)?,
        AttributeType::SOURCE_ADDRESS => address(AddressRole::SourceAddress, ctx, cursor)?,
        AttributeType::CHANGED_ADDRESS => address(AddressRole::ChangedAddress, ctx, cursor)?,
        AttributeType::REFLECTED_FROM => address(AddressRole::ReflectedFrom, ctx, cursor)?,
        AttributeType::CHANGE_REQUEST => ChangeRequest::decode(ctx, cursor)?.into(),
        AttributeType::USER_NAME => UserName::decode(ctx, cursor)?.into(),
        AttributeType::PASSWORD => Password::decode(ctx, cursor)?.into(),
        AttributeType::MESSAGE_INTEGRITY => MessageIntegrity::decode(cursor)?.into(),
        AttributeType::ERROR_CODE => ErrorCode::decode(cursor, RFC3489_ERROR_CLASSES)?.into(),
        AttributeType::UNKNOWN_ATTRIBUTES => UnknownAttributes::decode(ctx, cursor)?.into(),
        _ => return Ok(None),
    };
    Ok(Some(attr))
}
