// crates/meshgraph-core/src/net.rs
//
// Integer encoding of peer addresses as stored on chain.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Encode an address as the integer the chain stores.
///
/// IPv4 addresses map to their 32-bit value, IPv6 addresses to their
/// 128-bit value.
pub fn ip_to_int(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u32::from(v4) as u128,
        IpAddr::V6(v6) => u128::from(v6),
    }
}

/// Decode a chain-stored integer into an address.
///
/// Values that fit in 32 bits decode as IPv4.
pub fn int_to_ip(value: u128) -> IpAddr {
    match u32::try_from(value) {
        Ok(v4) => IpAddr::V4(Ipv4Addr::from(v4)),
        Err(_) => IpAddr::V6(Ipv6Addr::from(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_encodes_to_u32_value() {
        let addr: IpAddr = "206.189.254.5".parse().unwrap();
        assert_eq!(ip_to_int(addr), 3468557829);
        assert_eq!(int_to_ip(3468557829), addr);
    }

    #[test]
    fn ipv6_survives_encoding() {
        let addr: IpAddr = "2001:db8::1".parse().unwrap();
        assert_eq!(int_to_ip(ip_to_int(addr)), addr);
    }

    #[test]
    fn zero_is_unspecified_ipv4() {
        assert_eq!(int_to_ip(0), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }
}
