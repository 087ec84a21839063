//! Address validity and private-range membership.
//!
//! The range table is IPv4 only: RFC 1918 plus loopback. IPv4-mapped IPv6
//! addresses are unmapped before the lookup; any other IPv6 address is
//! reported as not private.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::LazyLock;

use ipnet::Ipv4Net;

/// Fixed private/reserved ranges, in lookup order.
static PRIVATE_RANGES: LazyLock<[Ipv4Net; 4]> = LazyLock::new(|| {
    [
        range(Ipv4Addr::new(10, 0, 0, 0), 8),
        range(Ipv4Addr::new(172, 16, 0, 0), 12),
        range(Ipv4Addr::new(192, 168, 0, 0), 16),
        range(Ipv4Addr::new(127, 0, 0, 0), 8),
    ]
});

fn range(base: Ipv4Addr, prefix: u8) -> Ipv4Net {
    Ipv4Net::new(base, prefix).expect("prefix length within 0..=32")
}

/// True when `addr` is a well-formed IPv4 or IPv6 literal.
pub fn is_valid(addr: &str) -> bool {
    addr.parse::<IpAddr>().is_ok()
}

/// True when `addr` is valid and inside one of the private ranges.
///
/// Invalid input is never private; callers that grant trust on this must
/// check [`is_valid`] too.
pub fn is_private(addr: &str) -> bool {
    let v4 = match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4,
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => v4,
            None => return false,
        },
        Err(_) => return false,
    };

    PRIVATE_RANGES.iter().any(|net| net.contains(&v4))
}

/// The private range table, for display and diagnostics.
pub fn private_ranges() -> &'static [Ipv4Net] {
    PRIVATE_RANGES.as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid() {
        assert!(is_valid("192.168.1.1"));
        assert!(is_valid("8.8.8.8"));
        assert!(is_valid("2001:db8::1"));
        assert!(is_valid("::1"));
        assert!(is_valid("::ffff:10.0.0.1"));

        assert!(!is_valid("192.168.1.256"));
        assert!(!is_valid(""));
        assert!(!is_valid("not-an-ip"));
        assert!(!is_valid("192.168.1"));
        assert!(!is_valid("203.0.113.5:8080"));
        assert!(!is_valid("fe80::1%eth0"));
        assert!(!is_valid(" 8.8.8.8"));
    }

    #[test]
    fn test_is_private() {
        assert!(is_private("10.0.0.1"));
        assert!(is_private("10.255.255.255"));
        assert!(is_private("172.16.0.1"));
        assert!(is_private("172.31.255.254"));
        assert!(is_private("192.168.1.1"));
        assert!(is_private("127.0.0.1"));

        assert!(!is_private("8.8.8.8"));
        assert!(!is_private("172.32.0.1"));
        assert!(!is_private("172.15.255.255"));
        assert!(!is_private("192.169.0.1"));
        assert!(!is_private("11.0.0.1"));
    }

    #[test]
    fn test_invalid_is_not_private() {
        assert!(!is_private(""));
        assert!(!is_private("10.0.0.256"));
        assert!(!is_private("localhost"));
    }

    #[test]
    fn test_ipv6() {
        assert!(is_private("::ffff:192.168.0.10"));
        assert!(!is_private("::ffff:8.8.8.8"));
        // IPv6 loopback and ULA are outside the table.
        assert!(!is_private("::1"));
        assert!(!is_private("fd00::1"));
    }

    #[test]
    fn test_range_table() {
        let ranges: Vec<String> = private_ranges().iter().map(|n| n.to_string()).collect();
        assert_eq!(
            ranges,
            vec!["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "127.0.0.0/8"]
        );
    }
}
