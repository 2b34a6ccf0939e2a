use std::io;
use std::net::IpAddr;

/// Source of the addresses assigned to this host
pub trait LocalAddresses {
    /// Returns every local IP address
    fn local_addresses(&self) -> io::Result<Vec<IpAddr>>;
}

/// Addresses of the network interfaces of the host
#[derive(Debug, Default, Clone, Copy)]
pub struct InterfaceAddresses;

impl LocalAddresses for InterfaceAddresses {
    fn local_addresses(&self) -> io::Result<Vec<IpAddr>> {
        Ok(if_addrs::get_if_addrs()?
            .into_iter()
            .map(|iface| iface.ip())
            .collect())
    }
}

/// Fixed list of addresses
#[derive(Debug, Default, Clone)]
pub struct StaticAddresses(Vec<IpAddr>);

impl StaticAddresses {
    /// Creates a source that always reports `addresses`
    pub fn new<I>(addresses: I) -> Self
    where
        I: IntoIterator<Item = IpAddr>,
    {
        Self(addresses.into_iter().collect())
    }
}

impl LocalAddresses for StaticAddresses {
    fn local_addresses(&self) -> io::Result<Vec<IpAddr>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn interface_addresses() {
        let addresses = InterfaceAddresses
            .local_addresses()
            .expect("Can not enumerate interfaces");
        // The loopback interface is always there
        assert!(addresses.iter().any(|addr| addr.is_loopback()));
    }

    #[test]
    fn static_addresses() {
        let addr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
        let local = StaticAddresses::new([addr]);
        assert_eq!(local.local_addresses().unwrap(), vec![addr]);
        assert!(StaticAddresses::default()
            .local_addresses()
            .unwrap()
            .is_empty());
    }
}
