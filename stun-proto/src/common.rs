use crate::error::{StunError, StunErrorType};
use crate::types::{Cookie, TransactionId};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

pub const DEFAULT_PADDING_VALUE: u8 = 0x00;

pub fn check_buffer_boundaries(buffer: &[u8], limit: usize) -> Result<(), StunError> {
    (buffer.len() >= limit).then_some(()).ok_or_else(|| {
        StunError::new(
            StunErrorType::OutOfRange,
            format!("Required size: {}, buffer size: {}", limit, buffer.len()),
        )
    })
}

pub fn padding(value_size: usize) -> usize {
    (4 - (value_size & 3)) & 3
}

/// Applies the XOR transform used by the `XOR-` address attributes. The transform is its
/// own inverse, so the same function obfuscates and recovers an address.
pub fn socket_addr_xor(
    addr: &SocketAddr,
    cookie: Cookie,
    transaction_id: &TransactionId,
) -> SocketAddr {
    let cookie_bytes = cookie.as_u32().to_be_bytes();
    let xor_port = addr.port() ^ (cookie.as_u32() >> 16) as u16;
    match addr.ip() {
        IpAddr::V4(ip) => {
            let mut octets = ip.octets();
            for (i, b) in octets.iter_mut().enumerate() {
                *b ^= cookie_bytes[i];
            }
            SocketAddr::new(IpAddr::V4(Ipv4Addr::from(octets)), xor_port)
        }
        IpAddr::V6(ip) => {
            let mut octets = ip.octets();
            let key = cookie_bytes.iter().chain(transaction_id.as_bytes().iter());
            for (b, k) in octets.iter_mut().zip(key) {
                *b ^= k;
            }
            SocketAddr::new(IpAddr::V6(Ipv6Addr::from(octets)), xor_port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MAGIC_COOKIE;
    use std::str::FromStr;

    #[test]
    fn buffer_boundaries() {
        let buffer = [];
        assert!(check_buffer_boundaries(&buffer, 0).is_ok());
        assert_eq!(
            check_buffer_boundaries(&buffer, 1).expect_err("Error expected"),
            StunErrorType::OutOfRange
        );

        let buffer: [u8; 1] = [0; 1];
        assert!(check_buffer_boundaries(&buffer, 1).is_ok());
        assert_eq!(
            check_buffer_boundaries(&buffer, 2).expect_err("Error expected"),
            StunErrorType::OutOfRange
        );
    }

    #[test]
    fn padding_size() {
        assert_eq!(padding(0), 0);
        assert_eq!(padding(1), 3);
        assert_eq!(padding(2), 2);
        assert_eq!(padding(3), 1);
        assert_eq!(padding(4), 0);
        assert_eq!(padding(9), 3);
    }

    #[test]
    fn xor_ipv4() {
        let tid = TransactionId::from([0x01; 12]);
        let addr = SocketAddr::from_str("192.0.2.1:32853").expect("Can not parse address");
        let xored = socket_addr_xor(&addr, MAGIC_COOKIE, &tid);
        assert_eq!(xored.port(), 0xa147);
        assert_eq!(xored.ip(), IpAddr::V4(Ipv4Addr::new(0xe1, 0x12, 0xa6, 0x43)));
        assert_eq!(socket_addr_xor(&xored, MAGIC_COOKIE, &tid), addr);
    }

    #[test]
    fn xor_ipv6() {
        let tid = TransactionId::from([
            0xb7, 0xe7, 0xa7, 0x01, 0xbc, 0x34, 0xd6, 0x86, 0xfa, 0x87, 0xdf, 0xae,
        ]);
        let addr = SocketAddr::from_str("[2001:db8:1234:5678:11:2233:4455:6677]:32853")
            .expect("Can not parse address");
        let xored = socket_addr_xor(&addr, MAGIC_COOKIE, &tid);
        let expected = Ipv6Addr::from([
            0x01, 0x13, 0xa9, 0xfa, 0xa5, 0xd3, 0xf1, 0x79, 0xbc, 0x25, 0xf4, 0xb5, 0xbe, 0xd2,
            0xb9, 0xd9,
        ]);
        assert_eq!(xored.ip(), IpAddr::V6(expected));
        assert_eq!(xored.port(), 0xa147);
        assert_eq!(socket_addr_xor(&xored, MAGIC_COOKIE, &tid), addr);

        for addr in ["[::]:0", "[ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff]:65535"] {
            let addr = SocketAddr::from_str(addr).expect("Can not parse address");
            let xored = socket_addr_xor(&addr, MAGIC_COOKIE, &tid);
            assert_ne!(xored, addr);
            assert_eq!(socket_addr_xor(&xored, MAGIC_COOKIE, &tid), addr);
        }
    }
}
