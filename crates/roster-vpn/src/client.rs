//! VPN clients.
//!
//! A client is the configuration a remote party installs: its own interface
//! and exactly one peer, the server. Each client shares a preshared key with
//! the server that no other client uses.

use std::net::{IpAddr, Ipv4Addr};

use chrono::{DateTime, SubsecRound, Utc};
use ipnet::{IpNet, Ipv4Net};
use once_cell::sync::Lazy;
use regex::Regex;
use roster_wireguard::{Configuration, Interface, Key, Peer};

use crate::error::{Result, VpnError};
use crate::keys::ClientKeys;
use crate::registry::ClientInfo;
use crate::settings::Settings;

/// Keepalive interval configured on the server peer of every client.
pub const CLIENT_KEEPALIVE: u16 = 25;

/// Name reserved for the server's own DNS entry.
pub const RESERVED_NAME: &str = "server";

static CLIENT_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9.@_-]{1,15}$").unwrap_or_else(|_| unreachable!()));

static FULL_TUNNEL: Lazy<[IpNet; 2]> = Lazy::new(|| {
    [
        "0.0.0.0/0".parse().unwrap_or_else(|_| unreachable!()),
        "::/0".parse().unwrap_or_else(|_| unreachable!()),
    ]
});

/// Checks a name for a new client.
///
/// Names are 1 to 15 characters from `[A-Za-z0-9.@_-]`, must not be all
/// digits, and must not be `server`.
///
/// # Errors
///
/// Returns [`VpnError::InvalidClientName`] naming the broken rule.
pub fn validate_client_name(name: &str) -> Result<()> {
    let reason = if !CLIENT_NAME_REGEX.is_match(name) {
        "name must only contain alphanumerics, period, @, underscore and hyphen, \
         and be 1 to 15 characters long"
    } else if name.bytes().all(|b| b.is_ascii_digit()) {
        "name must contain at least one non-digit character"
    } else if name == RESERVED_NAME {
        "name \"server\" is reserved"
    } else {
        return Ok(());
    };
    Err(VpnError::InvalidClientName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

/// A client configuration with its server-side state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    /// What the client installs. Its name is the client name.
    pub config: Configuration,
    /// Mirrors the disabled flag of the client's peer in the tunnel.
    pub disabled: bool,
    /// Creation time, to the second.
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Builds the configuration for a new client.
    ///
    /// The client's single peer is the server: its public key, the client's
    /// preshared key, a route for all traffic, the public endpoint from
    /// `settings`, and a keepalive of [`CLIENT_KEEPALIVE`] seconds.
    #[must_use]
    pub fn provision(
        keys: &ClientKeys,
        address: Ipv4Net,
        server_public_key: Key,
        settings: &Settings,
    ) -> Self {
        let mut server = Peer::new(server_public_key)
            .with_preshared_key(keys.preshared_key)
            .with_endpoint(settings.endpoint.clone())
            .with_persistent_keepalive(CLIENT_KEEPALIVE);
        server.allowed_ips.extend(FULL_TUNNEL.iter().copied());

        Self {
            config: Configuration {
                name: keys.name.clone(),
                interface: Interface {
                    private_key: keys.private_key,
                    addresses: vec![IpNet::V4(address)],
                    dns: settings.dns.clone(),
                    ..Interface::default()
                },
                peers: vec![server],
            },
            disabled: false,
            created_at: Utc::now().trunc_subsecs(0),
        }
    }

    /// Client name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Public key derived from the client's private key.
    #[must_use]
    pub fn public_key(&self) -> Key {
        self.config.interface.private_key.public_key()
    }

    /// Preshared key of the server peer.
    #[must_use]
    pub fn preshared_key(&self) -> Option<Key> {
        self.config.peers.first().and_then(|p| p.preshared_key)
    }

    /// The client's tunnel address.
    #[must_use]
    pub fn address(&self) -> Option<IpAddr> {
        self.config.interface.addresses.first().map(IpNet::addr)
    }

    /// The client's tunnel address, which must be IPv4.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::Inconsistent`] if the client has no IPv4 address.
    pub fn ipv4_address(&self) -> Result<Ipv4Addr> {
        match self.address() {
            Some(IpAddr::V4(addr)) => Ok(addr),
            _ => Err(VpnError::Inconsistent(format!(
                "client {} has no IPv4 address",
                self.name()
            ))),
        }
    }

    /// Host name for the DNS host file: every character outside
    /// `[A-Za-z0-9-]` becomes `-`.
    #[must_use]
    pub fn dns_name(&self) -> String {
        self.name()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
            .collect()
    }

    /// The peer entry for this client in the server's tunnel.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::Inconsistent`] if the client has no IPv4 address.
    pub fn to_peer(&self) -> Result<Peer> {
        let address = self.ipv4_address()?;
        let mut peer = Peer::new(self.public_key())
            .with_name(self.name())
            .with_allowed_ip(IpNet::from(IpAddr::V4(address)));
        peer.preshared_key = self.preshared_key();
        peer.disabled = self.disabled;
        Ok(peer)
    }

    /// The registry entry for this client.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::Inconsistent`] if the client has no IPv4 address.
    pub fn info(&self) -> Result<ClientInfo> {
        Ok(ClientInfo {
            name: self.name().to_string(),
            public_key: self.public_key(),
            created_at: self.created_at,
            address: self.ipv4_address()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_wireguard::{Endpoint, KEY_SIZE};
    use test_case::test_case;

    fn settings() -> Settings {
        Settings::from_vars([
            ("pivpnHOST", "vpn.example.com"),
            ("pivpnDNS1", "10.6.0.1"),
            ("install_home", "/home/pi"),
        ])
        .expect("valid settings")
    }

    fn client(name: &str) -> (Client, ClientKeys, Key) {
        let keys = ClientKeys::generate(name);
        let server = Key::from_bytes_array([7; KEY_SIZE]);
        let address: Ipv4Net = "10.6.0.2/24".parse().expect("valid prefix");
        (Client::provision(&keys, address, server, &settings()), keys, server)
    }

    #[test_case("alice")]
    #[test_case("a")]
    #[test_case("phone.1@home_x")]
    #[test_case("1a")]
    #[test_case("abcdefghijklmn1" ; "fifteen chars")]
    fn valid_names(name: &str) {
        validate_client_name(name).expect("valid name");
    }

    #[test_case("" ; "empty")]
    #[test_case("has space")]
    #[test_case("semi;colon")]
    #[test_case("ünïcode" ; "non ascii")]
    #[test_case("1234567890123456" ; "too long")]
    fn invalid_characters_or_length(name: &str) {
        let err = validate_client_name(name).expect_err("invalid");
        assert!(err.to_string().contains("1 to 15 characters"));
    }

    #[test]
    fn all_digit_names_rejected() {
        let err = validate_client_name("12345").expect_err("all digits");
        assert!(err.to_string().contains("at least one non-digit"));
    }

    #[test]
    fn server_is_reserved() {
        let err = validate_client_name("server").expect_err("reserved");
        assert!(matches!(err, VpnError::InvalidClientName { .. }));
        validate_client_name("server2").expect("only the exact name is reserved");
    }

    #[test]
    fn provisioned_client_layout() {
        let (client, keys, server) = client("alice");
        let config = &client.config;

        assert_eq!(client.name(), "alice");
        assert!(!client.disabled);
        assert_eq!(config.interface.private_key, keys.private_key);
        assert_eq!(config.interface.addresses[0].to_string(), "10.6.0.2/24");
        assert_eq!(config.interface.dns.len(), 1);

        assert_eq!(config.peers.len(), 1);
        let peer = &config.peers[0];
        assert_eq!(peer.name, None);
        assert_eq!(peer.public_key, server);
        assert_eq!(peer.preshared_key, Some(keys.preshared_key));
        assert_eq!(peer.endpoint, Some(Endpoint::new("vpn.example.com", 51820)));
        assert_eq!(peer.persistent_keepalive, CLIENT_KEEPALIVE);
        let routes: Vec<String> = peer.allowed_ips.iter().map(ToString::to_string).collect();
        assert_eq!(routes, vec!["0.0.0.0/0", "::/0"]);
    }

    #[test]
    fn provisioned_config_reparses() {
        let (client, _, _) = client("alice");
        let parsed = roster_wireguard::parse_config(&client.config.export(), "alice")
            .expect("valid export");
        assert_eq!(parsed, client.config);
    }

    #[test]
    fn server_side_peer() {
        let (client, keys, _) = client("alice");
        let peer = client.to_peer().expect("peer");
        assert_eq!(peer.name(), "alice");
        assert_eq!(peer.public_key, keys.public_key());
        assert_eq!(peer.preshared_key, Some(keys.preshared_key));
        assert_eq!(peer.allowed_ips.len(), 1);
        assert_eq!(peer.allowed_ips[0].to_string(), "10.6.0.2/32");
        assert!(!peer.disabled);
    }

    #[test]
    fn registry_entry() {
        let (client, keys, _) = client("alice");
        let info = client.info().expect("info");
        assert_eq!(info.name, "alice");
        assert_eq!(info.public_key, keys.public_key());
        assert_eq!(info.address, Ipv4Addr::new(10, 6, 0, 2));
        assert_eq!(info.created_at, client.created_at);
        assert_eq!(client.created_at.timestamp_subsec_nanos(), 0);
    }

    #[test_case("alice", "alice")]
    #[test_case("phone.1@home_x", "phone-1-home-x")]
    #[test_case("a..b", "a--b" ; "each character replaced")]
    fn dns_names(name: &str, expected: &str) {
        let (client, _, _) = client(name);
        assert_eq!(client.dns_name(), expected);
    }

    #[test]
    fn missing_address_is_inconsistent() {
        let (mut client, _, _) = client("alice");
        client.config.interface.addresses.clear();
        assert!(matches!(client.to_peer(), Err(VpnError::Inconsistent(_))));
        assert!(matches!(client.info(), Err(VpnError::Inconsistent(_))));
    }
}
