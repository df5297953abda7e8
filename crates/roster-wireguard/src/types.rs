//! Core value types for `WireGuard` configuration.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

use ipnet::IpNet;

use crate::error::{Result, WireGuardError};

/// A peer endpoint: a host (IP literal or DNS name) and a UDP port.
///
/// A peer with no endpoint carries `None` rather than an empty value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// IP literal or DNS name. IPv6 literals are stored without brackets and
    /// may carry a `%zone` suffix.
    pub host: String,
    /// UDP port.
    pub port: u16,
}

impl Endpoint {
    /// Creates a new endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for Endpoint {
    type Err = WireGuardError;

    fn from_str(s: &str) -> Result<Self> {
        let Some((host, port)) = s.rsplit_once(':') else {
            return Err(WireGuardError::parse("Missing port from endpoint", s));
        };
        if host.is_empty() {
            return Err(WireGuardError::parse("Invalid endpoint host", host));
        }
        let port = parse_port(port)?;

        let bracketed = host.starts_with('[') || host.ends_with(']') || host.contains(':');
        if !bracketed {
            return Ok(Self::new(host, port));
        }

        let brackets_error = || WireGuardError::parse("Brackets must contain an IPv6 address", host);
        let inner = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .filter(|h| h.len() > 1 && h.contains(':'))
            .ok_or_else(brackets_error)?;
        let literal = match inner.rfind('%') {
            Some(zone) if zone > 0 => &inner[..zone],
            _ => inner,
        };
        literal.parse::<Ipv6Addr>().map_err(|_| brackets_error())?;

        Ok(Self::new(inner, port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Parses a CIDR prefix, accepting a bare address as a host route.
///
/// # Errors
///
/// Returns an error if the input is neither a prefix nor an address.
pub fn parse_prefix(s: &str) -> Result<IpNet> {
    if let Ok(net) = s.parse::<IpNet>() {
        return Ok(net);
    }
    s.parse::<IpAddr>()
        .map(IpNet::from)
        .map_err(|_| WireGuardError::parse("Invalid IP address", s))
}

/// Returns the prefix as a full-length host route for its address.
#[must_use]
pub fn host_route(net: &IpNet) -> IpNet {
    IpNet::from(net.addr())
}

pub(crate) fn parse_port(s: &str) -> Result<u16> {
    parse_bounded(s, 0, 65535, "Invalid port")
}

pub(crate) fn parse_mtu(s: &str) -> Result<u16> {
    parse_bounded(s, 576, 65535, "Invalid MTU")
}

pub(crate) fn parse_persistent_keepalive(s: &str) -> Result<u16> {
    if s == "off" {
        return Ok(0);
    }
    parse_bounded(s, 0, 65535, "Invalid persistent keepalive")
}

/// Interprets a `Table` value, returning true when routing tables are off.
pub(crate) fn parse_table_off(s: &str) -> Result<bool> {
    match s {
        "off" => Ok(true),
        "auto" | "main" => Ok(false),
        _ => s
            .parse::<u32>()
            .map(|_| false)
            .map_err(|e| WireGuardError::parse(format!("Invalid table: {e}"), s)),
    }
}

fn parse_bounded(s: &str, min: i64, max: i64, why: &str) -> Result<u16> {
    let n = s
        .parse::<i64>()
        .map_err(|e| WireGuardError::parse(format!("{why}: {e}"), s))?;
    if n < min || n > max {
        return Err(WireGuardError::parse(why, s));
    }
    u16::try_from(n).map_err(|_| WireGuardError::parse(why, s))
}

/// Splits a comma-separated list, rejecting empty elements.
pub(crate) fn split_list(s: &str) -> Result<Vec<&str>> {
    s.split(',')
        .map(|item| {
            let item = item.trim();
            if item.is_empty() {
                Err(WireGuardError::parse("Two commas in a row", s))
            } else {
                Ok(item)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("192.168.1.1:51820", "192.168.1.1", 51820 ; "ipv4")]
    #[test_case("vpn.example.com:443", "vpn.example.com", 443 ; "dns name")]
    #[test_case("[2001:db8::1]:51820", "2001:db8::1", 51820 ; "ipv6")]
    #[test_case("[fe80::1%eth0]:51820", "fe80::1%eth0", 51820 ; "ipv6 with zone")]
    fn endpoint_parses(input: &str, host: &str, port: u16) {
        let endpoint: Endpoint = input.parse().expect("valid endpoint");
        assert_eq!(endpoint.host, host);
        assert_eq!(endpoint.port, port);
    }

    #[test_case("example.com" ; "missing port")]
    #[test_case(":51820" ; "missing host")]
    #[test_case("example.com:99999" ; "port out of range")]
    #[test_case("example.com:port" ; "non numeric port")]
    #[test_case("2001:db8::1:51820" ; "unbracketed ipv6")]
    #[test_case("[example.com]:51820" ; "bracketed name")]
    #[test_case("[10.0.0.1]:51820" ; "bracketed ipv4")]
    fn endpoint_rejects(input: &str) {
        assert!(input.parse::<Endpoint>().is_err());
    }

    #[test]
    fn endpoint_display_brackets_ipv6() {
        assert_eq!(Endpoint::new("2001:db8::1", 51820).to_string(), "[2001:db8::1]:51820");
        assert_eq!(Endpoint::new("fe80::1%eth0", 1).to_string(), "[fe80::1%eth0]:1");
        assert_eq!(Endpoint::new("vpn.example.com", 51820).to_string(), "vpn.example.com:51820");
    }

    #[test]
    fn endpoint_display_roundtrip() {
        for input in ["1.2.3.4:5", "[::1]:51820", "host.lan:0"] {
            let endpoint: Endpoint = input.parse().expect("valid");
            assert_eq!(endpoint.to_string(), input);
        }
    }

    #[test]
    fn bare_address_is_host_route() {
        assert_eq!(parse_prefix("10.0.0.2").expect("valid").to_string(), "10.0.0.2/32");
        assert_eq!(parse_prefix("fd00::2").expect("valid").to_string(), "fd00::2/128");
    }

    #[test]
    fn prefix_keeps_host_bits() {
        let net = parse_prefix("10.0.0.1/24").expect("valid");
        assert_eq!(net.to_string(), "10.0.0.1/24");
        assert_eq!(host_route(&net).to_string(), "10.0.0.1/32");
    }

    #[test]
    fn invalid_prefix_rejected() {
        assert!(parse_prefix("10.0.0.0/33").is_err());
        assert!(parse_prefix("not-an-ip").is_err());
    }

    #[test_case("576", Some(576))]
    #[test_case("1420", Some(1420))]
    #[test_case("65535", Some(65535))]
    #[test_case("575", None)]
    #[test_case("65536", None)]
    #[test_case("big", None)]
    fn mtu_bounds(input: &str, expected: Option<u16>) {
        assert_eq!(parse_mtu(input).ok(), expected);
    }

    #[test]
    fn keepalive_off_is_zero() {
        assert_eq!(parse_persistent_keepalive("off").expect("valid"), 0);
        assert_eq!(parse_persistent_keepalive("25").expect("valid"), 25);
        assert!(parse_persistent_keepalive("-1").is_err());
    }

    #[test]
    fn table_values() {
        assert!(parse_table_off("off").expect("valid"));
        assert!(!parse_table_off("auto").expect("valid"));
        assert!(!parse_table_off("main").expect("valid"));
        assert!(!parse_table_off("1234").expect("valid"));
        assert!(parse_table_off("sometable").is_err());
    }

    #[test]
    fn split_list_rejects_empty_items() {
        assert_eq!(split_list("a, b,c").expect("valid"), vec!["a", "b", "c"]);
        let err = split_list("a,,b").expect_err("two commas");
        assert!(err.to_string().starts_with("Two commas in a row"));
        assert!(split_list("a,").is_err());
    }
}
