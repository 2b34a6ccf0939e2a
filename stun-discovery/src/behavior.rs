//! Behaviors described in [`RFC 4787`](https://datatracker.ietf.org/doc/html/rfc4787)
//! and the classic RFC 3489 NAT types derived from them.

use std::fmt;

/// How a NAT reuses the public address it allocates for an internal endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingBehavior {
    /// The probes got no usable response
    Blocked,
    /// The same mapping is used for every destination
    EndpointIndependent,
    /// The mapping changes with the destination address
    AddressDependent,
    /// The mapping changes with the destination address or port
    AddressAndPortDependent,
}

/// Which external endpoints may send packets through a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilteringBehavior {
    /// The probes got no usable response
    Blocked,
    /// Any external endpoint
    EndpointIndependent,
    /// Endpoints on addresses the internal endpoint has sent to
    AddressDependent,
    /// Only the exact endpoints the internal endpoint has sent to
    AddressAndPortDependent,
}

/// NAT types as named by RFC 3489
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NatType {
    /// No NAT nor filtering firewall
    Open,
    /// Endpoint independent mapping and filtering
    FullCone,
    /// Endpoint independent mapping, address dependent filtering
    RestrictedCone,
    /// Endpoint independent mapping, address and port dependent filtering
    PortRestrictedCone,
    /// Destination dependent mapping
    Symmetric,
    /// STUN traffic does not get through
    Blocked,
}

impl NatType {
    /// Derives the NAT type from the observed behaviors. `public_address` tells whether
    /// the mapped address is one of the host addresses.
    pub fn from_behavior(
        mapping: MappingBehavior,
        filtering: FilteringBehavior,
        public_address: bool,
    ) -> Self {
        match (mapping, filtering) {
            (MappingBehavior::Blocked, _) | (_, FilteringBehavior::Blocked) => NatType::Blocked,
            (MappingBehavior::AddressDependent, _)
            | (MappingBehavior::AddressAndPortDependent, _) => NatType::Symmetric,
            (MappingBehavior::EndpointIndependent, FilteringBehavior::EndpointIndependent) => {
                if public_address {
                    NatType::Open
                } else {
                    NatType::FullCone
                }
            }
            (MappingBehavior::EndpointIndependent, FilteringBehavior::AddressDependent) => {
                NatType::RestrictedCone
            }
            (MappingBehavior::EndpointIndependent, FilteringBehavior::AddressAndPortDependent) => {
                NatType::PortRestrictedCone
            }
        }
    }
}

impl fmt::Display for MappingBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MappingBehavior::Blocked => "blocked",
            MappingBehavior::EndpointIndependent => "endpoint independent",
            MappingBehavior::AddressDependent => "address dependent",
            MappingBehavior::AddressAndPortDependent => "address and port dependent",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for FilteringBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilteringBehavior::Blocked => "blocked",
            FilteringBehavior::EndpointIndependent => "endpoint independent",
            FilteringBehavior::AddressDependent => "address dependent",
            FilteringBehavior::AddressAndPortDependent => "address and port dependent",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for NatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NatType::Open => "Open Internet",
            NatType::FullCone => "Full Cone",
            NatType::RestrictedCone => "Restricted Cone",
            NatType::PortRestrictedCone => "Port Restricted Cone",
            NatType::Symmetric => "Symmetric",
            NatType::Blocked => "Blocked",
        };
        write!(f, "{}", name)
    }
}
