//! Public IPv4 validation and the `PublicIp` value type.

use crate::error::{MonitorError, Result};
use std::fmt;

/// Check whether a string is an acceptable public IPv4 address.
///
/// Rules, applied in order (first failure wins):
/// 1. Exactly 4 dot-separated segments.
/// 2. Every segment is all-digit and in `0..=255`.
/// 3. Not loopback (`127.x.x.x`).
/// 4. Not "this network" (`0.x.x.x`).
/// 5. Not link-local (`169.254.x.x`).
pub fn is_valid_public_ipv4(candidate: &str) -> bool {
    let parts: Vec<&str> = candidate.split('.').collect();

    if parts.len() != 4 {
        return false;
    }

    for part in &parts {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        match part.parse::<u32>() {
            Ok(n) if n <= 255 => {}
            _ => return false,
        }
    }

    if parts[0] == "127" || parts[0] == "0" {
        return false;
    }

    if parts[0] == "169" && parts[1] == "254" {
        return false;
    }

    true
}

/// A validated public IPv4 address.
///
/// Can only be constructed through [`PublicIp::parse`], so every value of
/// this type satisfies [`is_valid_public_ipv4`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicIp(String);

impl PublicIp {
    /// Parse and validate a candidate address.
    pub fn parse(candidate: &str) -> Result<Self> {
        let candidate = candidate.trim();
        if is_valid_public_ipv4(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(MonitorError::InvalidIp(candidate.to_string()))
        }
    }

    /// The dotted-quad string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ordinary_public_addresses() {
        assert!(is_valid_public_ipv4("8.8.8.8"));
        assert!(is_valid_public_ipv4("1.2.3.4"));
        assert!(is_valid_public_ipv4("255.255.255.255"));
        assert!(is_valid_public_ipv4("203.0.113.7"));
    }

    #[test]
    fn test_rejects_wrong_segment_count() {
        assert!(!is_valid_public_ipv4("1.2.3"));
        assert!(!is_valid_public_ipv4("1.2.3.4.5"));
        assert!(!is_valid_public_ipv4(""));
        assert!(!is_valid_public_ipv4("1234"));
        assert!(!is_valid_public_ipv4("1.2.3."));
    }

    #[test]
    fn test_rejects_non_numeric_segments() {
        assert!(!is_valid_public_ipv4("a.b.c.d"));
        assert!(!is_valid_public_ipv4("1.2.3.x"));
        assert!(!is_valid_public_ipv4("1.2.-3.4"));
        assert!(!is_valid_public_ipv4("1. 2.3.4"));
    }

    #[test]
    fn test_rejects_out_of_range_segments() {
        assert!(!is_valid_public_ipv4("300.1.1.1"));
        assert!(!is_valid_public_ipv4("1.256.1.1"));
        assert!(!is_valid_public_ipv4("1.1.1.999"));
    }

    #[test]
    fn test_rejects_loopback() {
        assert!(!is_valid_public_ipv4("127.0.0.1"));
        assert!(!is_valid_public_ipv4("127.255.255.255"));
    }

    #[test]
    fn test_rejects_this_network() {
        assert!(!is_valid_public_ipv4("0.0.0.0"));
        assert!(!is_valid_public_ipv4("0.1.2.3"));
    }

    #[test]
    fn test_rejects_link_local() {
        assert!(!is_valid_public_ipv4("169.254.1.1"));
        assert!(!is_valid_public_ipv4("169.254.0.0"));
        // 169.x outside the link-local block is fine
        assert!(is_valid_public_ipv4("169.253.1.1"));
        assert!(is_valid_public_ipv4("169.1.1.1"));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let ip = PublicIp::parse("  8.8.8.8\n").unwrap();
        assert_eq!(ip.as_str(), "8.8.8.8");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(PublicIp::parse("127.0.0.1").is_err());
        assert!(PublicIp::parse("not-an-ip").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let ip = PublicIp::parse("2.2.2.2").unwrap();
        assert_eq!(ip.to_string(), "2.2.2.2");
    }
}
