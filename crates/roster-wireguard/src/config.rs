//! `WireGuard` configuration model and export.
//!
//! Export is a structural re-emission of the model: comments and key order
//! from the parsed text are not preserved. Peers flagged as disabled have
//! every line of their block prefixed with [`DISABLED_PREFIX`], so a disabled
//! peer stays in the file as an inert, commented-out block.

use std::collections::HashSet;
use std::fmt::Write as FmtWrite;
use std::net::IpAddr;

use ipnet::IpNet;

use crate::keys::Key;
use crate::types::{host_route, Endpoint};

/// Line prefix marking a disabled peer block.
pub const DISABLED_PREFIX: &str = "#[disabled] ";

/// The local side of a tunnel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Interface {
    /// The interface's private key.
    pub private_key: Key,
    /// Local address prefixes.
    pub addresses: Vec<IpNet>,
    /// Listen port, 0 when unset.
    pub listen_port: u16,
    /// MTU, 0 when unset.
    pub mtu: u16,
    /// DNS resolver addresses.
    pub dns: Vec<IpAddr>,
    /// DNS search domains.
    pub dns_search: Vec<String>,
    /// Command run before the interface comes up.
    pub pre_up: String,
    /// Command run after the interface comes up.
    pub post_up: String,
    /// Command run before the interface goes down.
    pub pre_down: String,
    /// Command run after the interface goes down.
    pub post_down: String,
    /// `Table = off`: do not install routes.
    pub table_off: bool,
}

/// A remote party within a configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Peer {
    /// External name, taken from the `### begin <name> ###` marker.
    pub name: Option<String>,
    /// Whether the peer block is commented out with the disabled marker.
    pub disabled: bool,
    /// The peer's public key.
    pub public_key: Key,
    /// Optional preshared key.
    pub preshared_key: Option<Key>,
    /// Routes this peer may originate and receive.
    pub allowed_ips: Vec<IpNet>,
    /// Optional remote endpoint.
    pub endpoint: Option<Endpoint>,
    /// Keepalive interval in seconds, 0 when disabled.
    pub persistent_keepalive: u16,
}

impl Peer {
    /// Creates a peer with the given public key.
    #[must_use]
    pub fn new(public_key: Key) -> Self {
        Self {
            public_key,
            ..Self::default()
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the preshared key.
    #[must_use]
    pub fn with_preshared_key(mut self, key: Key) -> Self {
        self.preshared_key = Some(key);
        self
    }

    /// Adds an allowed IP.
    #[must_use]
    pub fn with_allowed_ip(mut self, net: IpNet) -> Self {
        self.allowed_ips.push(net);
        self
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Sets the persistent keepalive interval.
    #[must_use]
    pub fn with_persistent_keepalive(mut self, seconds: u16) -> Self {
        self.persistent_keepalive = seconds;
        self
    }

    /// Returns the peer name, or an empty string for unnamed peers.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Renders this peer's block.
    #[must_use]
    pub fn export(&self) -> String {
        let prefix = if self.disabled { DISABLED_PREFIX } else { "" };
        let mut output = String::new();

        if let Some(name) = &self.name {
            let _ = writeln!(output, "{prefix}### begin {name} ###");
        }
        let _ = writeln!(output, "{prefix}[Peer]");
        let _ = writeln!(output, "{prefix}PublicKey = {}", self.public_key);

        if let Some(psk) = self.preshared_key.filter(|k| !k.is_zero()) {
            let _ = writeln!(output, "{prefix}PresharedKey = {psk}");
        }
        if !self.allowed_ips.is_empty() {
            let _ = writeln!(output, "{prefix}AllowedIPs = {}", join(&self.allowed_ips));
        }
        if let Some(endpoint) = &self.endpoint {
            let _ = writeln!(output, "{prefix}Endpoint = {endpoint}");
        }
        if self.persistent_keepalive > 0 {
            let _ = writeln!(
                output,
                "{prefix}PersistentKeepalive = {}",
                self.persistent_keepalive
            );
        }
        if let Some(name) = &self.name {
            let _ = writeln!(output, "{prefix}### end {name} ###");
        }

        output
    }
}

/// A full configuration: one interface and its peers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Configuration {
    /// Configuration name (the tunnel or client name).
    pub name: String,
    /// The local interface.
    pub interface: Interface,
    /// Peers in file order.
    pub peers: Vec<Peer>,
}

impl Configuration {
    /// Creates an empty configuration with the given name and private key.
    #[must_use]
    pub fn new(name: impl Into<String>, private_key: Key) -> Self {
        Self {
            name: name.into(),
            interface: Interface {
                private_key,
                ..Interface::default()
            },
            peers: Vec::new(),
        }
    }

    /// Renders the configuration in `wg-quick` format.
    #[must_use]
    pub fn export(&self) -> String {
        let iface = &self.interface;
        let mut output = String::new();

        output.push_str("[Interface]\n");
        let _ = writeln!(output, "PrivateKey = {}", iface.private_key);

        if iface.listen_port > 0 {
            let _ = writeln!(output, "ListenPort = {}", iface.listen_port);
        }
        if !iface.addresses.is_empty() {
            let _ = writeln!(output, "Address = {}", join(&iface.addresses));
        }
        if !iface.dns.is_empty() || !iface.dns_search.is_empty() {
            let entries: Vec<String> = iface
                .dns
                .iter()
                .map(ToString::to_string)
                .chain(iface.dns_search.iter().cloned())
                .collect();
            let _ = writeln!(output, "DNS = {}", entries.join(", "));
        }
        if iface.mtu > 0 {
            let _ = writeln!(output, "MTU = {}", iface.mtu);
        }
        for (key, value) in [
            ("PreUp", &iface.pre_up),
            ("PostUp", &iface.post_up),
            ("PreDown", &iface.pre_down),
            ("PostDown", &iface.post_down),
        ] {
            if !value.is_empty() {
                let _ = writeln!(output, "{key} = {value}");
            }
        }
        if iface.table_off {
            output.push_str("Table = off\n");
        }

        for peer in &self.peers {
            output.push('\n');
            output.push_str(&peer.export());
        }

        output
    }

    /// Drops repeated interface addresses, resolvers and per-peer allowed
    /// IPs, keeping the first occurrence of each.
    pub fn deduplicate_network_entries(&mut self) {
        dedup_in_place(&mut self.interface.addresses);
        dedup_in_place(&mut self.interface.dns);
        for peer in &mut self.peers {
            dedup_in_place(&mut peer.allowed_ips);
        }
    }

    /// Returns true if any route of `other` collides with a route of `self`.
    ///
    /// Interface addresses count both as host routes and as their masked
    /// network; peer allowed IPs count as their masked network.
    #[must_use]
    pub fn intersects_with(&self, other: &Self) -> bool {
        let mut routes: HashSet<IpNet> = HashSet::new();
        for addr in &self.interface.addresses {
            routes.insert(host_route(addr));
            routes.insert(addr.trunc());
        }
        for peer in &self.peers {
            routes.extend(peer.allowed_ips.iter().map(IpNet::trunc));
        }

        other
            .interface
            .addresses
            .iter()
            .any(|a| routes.contains(&host_route(a)) || routes.contains(&a.trunc()))
            || other
                .peers
                .iter()
                .flat_map(|p| p.allowed_ips.iter())
                .any(|a| routes.contains(&a.trunc()))
    }

    /// Zeroes every key so the configuration can be shown safely.
    pub fn redact(&mut self) {
        self.interface.private_key = Key::default();
        for peer in &mut self.peers {
            peer.public_key = Key::default();
            peer.preshared_key = None;
        }
    }
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn dedup_in_place<T: Clone + Eq + std::hash::Hash>(items: &mut Vec<T>) {
    let mut seen = HashSet::with_capacity(items.len());
    items.retain(|item| seen.insert(item.clone()));
}
