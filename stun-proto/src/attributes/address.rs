use crate::attributes::{AsVerifiable, AttributeType, EncodeAttributeValue, StunAttributeType};
use crate::common::socket_addr_xor;
use crate::context::AttributeContext;
use crate::cursor::{BitCursor, BitWriter};
use crate::error::{StunError, StunErrorType};
use crate::types::AddressFamily;
use std::convert::TryFrom;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

const IPV4_VALUE_SIZE: usize = 8;
const IPV6_VALUE_SIZE: usize = 20;

/// The attribute an address value is carried in. All of them share the same value layout,
/// the role determines the wire type and whether the XOR transform applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressRole {
    /// `MAPPED-ADDRESS`
    MappedAddress,
    /// `XOR-MAPPED-ADDRESS`
    XorMappedAddress,
    /// `RESPONSE-ADDRESS`
    ResponseAddress,
    /// `SOURCE-ADDRESS`
    SourceAddress,
    /// `CHANGED-ADDRESS`
    ChangedAddress,
    /// `REFLECTED-FROM`
    ReflectedFrom,
    /// `ALTERNATE-SERVER`
    AlternateServer,
    /// `RESPONSE-ORIGIN`
    ResponseOrigin,
    /// `OTHER-ADDRESS`
    OtherAddress,
}

impl AddressRole {
    /// Wire type of the attribute carrying this role
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AddressRole::MappedAddress => AttributeType::MAPPED_ADDRESS,
            AddressRole::XorMappedAddress => AttributeType::XOR_MAPPED_ADDRESS,
            AddressRole::ResponseAddress => AttributeType::RESPONSE_ADDRESS,
            AddressRole::SourceAddress => AttributeType::SOURCE_ADDRESS,
            AddressRole::ChangedAddress => AttributeType::CHANGED_ADDRESS,
            AddressRole::ReflectedFrom => AttributeType::REFLECTED_FROM,
            AddressRole::AlternateServer => AttributeType::ALTERNATE_SERVER,
            AddressRole::ResponseOrigin => AttributeType::RESPONSE_ORIGIN,
            AddressRole::OtherAddress => AttributeType::OTHER_ADDRESS,
        }
    }

    /// Returns `true` if the address is obfuscated on the wire
    pub fn is_xor(&self) -> bool {
        matches!(self, AddressRole::XorMappedAddress)
    }
}

/// Address value shared by every address bearing attribute.
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |0 0 0 0 0 0 0 0|    Family     |           Port                |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// |                 Address (32 bits or 128 bits)                 |
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
/// The address exposed is always the logical one; the XOR transform is applied when
/// reading from and writing to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressAttribute {
    role: AddressRole,
    address: SocketAddr,
}

impl AddressAttribute {
    /// Creates an address attribute
    pub fn new(role: AddressRole, address: SocketAddr) -> Self {
        Self { role, address }
    }

    /// Creates a `XOR-MAPPED-ADDRESS` attribute
    pub fn xor_mapped_address(address: SocketAddr) -> Self {
        Self::new(AddressRole::XorMappedAddress, address)
    }

    /// Creates a `MAPPED-ADDRESS` attribute
    pub fn mapped_address(address: SocketAddr) -> Self {
        Self::new(AddressRole::MappedAddress, address)
    }

    /// Creates an `OTHER-ADDRESS` attribute
    pub fn other_address(address: SocketAddr) -> Self {
        Self::new(AddressRole::OtherAddress, address)
    }

    /// Creates a `CHANGED-ADDRESS` attribute
    pub fn changed_address(address: SocketAddr) -> Self {
        Self::new(AddressRole::ChangedAddress, address)
    }

    /// Returns the role of this address
    pub fn role(&self) -> AddressRole {
        self.role
    }

    /// Returns the logical address
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub(crate) fn decode(
        role: AddressRole,
        ctx: &AttributeContext,
        cursor: &mut BitCursor,
    ) -> Result<Self, StunError> {
        let size = cursor.remaining_bytes();
        if size < 4 {
            return Err(StunError::new(
                StunErrorType::MalformedAttribute,
                format!("Address value of {} bytes is too short", size),
            ));
        }

        // Reserved byte
        cursor.read_u8()?;
        let family = AddressFamily::try_from(cursor.read_u8()?)?;
        let port = cursor.read_u16()?;

        let expected = match family {
            AddressFamily::IPv4 => IPV4_VALUE_SIZE,
            AddressFamily::IPv6 => IPV6_VALUE_SIZE,
        };
        if size != expected {
            return Err(StunError::new(
                StunErrorType::MalformedAttribute,
                format!(
                    "{:?} address requires {} bytes, declared {}",
                    family, expected, size
                ),
            ));
        }

        let ip = match family {
            // Widths 32 and 128 always fit their targets
            AddressFamily::IPv4 => IpAddr::V4(Ipv4Addr::from(cursor.read_bits(32)? as u32)),
            AddressFamily::IPv6 => IpAddr::V6(Ipv6Addr::from(cursor.read_bits(128)?)),
        };

        let mut address = SocketAddr::new(ip, port);
        if role.is_xor() {
            address = socket_addr_xor(&address, ctx.cookie, &ctx.transaction_id);
        }

        Ok(Self { role, address })
    }
}

impl StunAttributeType for AddressAttribute {
    fn attribute_type(&self) -> AttributeType {
        self.role.attribute_type()
    }
}

impl AsVerifiable for AddressAttribute {}

impl EncodeAttributeValue for AddressAttribute {
    fn value_size(&self) -> usize {
        match self.address {
            SocketAddr::V4(_) => IPV4_VALUE_SIZE,
            SocketAddr::V6(_) => IPV6_VALUE_SIZE,
        }
    }

    fn encode(&self, ctx: &AttributeContext, writer: &mut BitWriter) -> Result<(), StunError> {
        let address = if self.role.is_xor() {
            socket_addr_xor(&self.address, ctx.cookie, &ctx.transaction_id)
        } else {
            self.address
        };

        writer.write_u8(0)?;
        match address.ip() {
            IpAddr::V4(ip) => {
                writer.write_u8(AddressFamily::IPv4 as u8)?;
                writer.write_u16(address.port())?;
                writer.write_u32(u32::from(ip))
            }
            IpAddr::V6(ip) => {
                writer.write_u8(AddressFamily::IPv6 as u8)?;
                writer.write_u16(address.port())?;
                writer.write_bits(u128::from(ip), 128)
            }
        }
    }
}
