//! The VPN state and client lifecycle.
//!
//! [`Vpn`] owns the server configuration and the client list, and keeps four
//! on-disk artifacts in step with them:
//!
//! - the tunnel file, `<tunnel_dir>/<interface>.conf`
//! - the registry, `<configs_dir>/clients.txt`, plus one
//!   `<configs_dir>/<name>.conf` per client and a copy of it in the user's
//!   config directory
//! - three key files per client in the keys directory
//! - the DNS host file, only if it already exists
//!
//! Every mutation holds one lock for its whole duration. Multi-file updates
//! are not transactional: if a step fails, the steps before it stay on disk
//! and [`Vpn::sync`] or the next [`Vpn::load`] is where the drift shows up.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use roster_wireguard::{parse_config, Configuration};
use tracing::{info, warn};

use crate::allocator::AddressAllocator;
use crate::client::{validate_client_name, Client};
use crate::error::{Result, VpnError};
use crate::files::{self, CONFIG_MODE, PUBLIC_MODE};
use crate::hosts::render_hosts;
use crate::keys::ClientKeys;
use crate::registry::{export_registry, parse_registry, ClientInfo, REGISTRY_FILE};
use crate::settings::Settings;

/// Where the VPN's files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    /// Tunnel interface name.
    pub interface: String,
    /// Installer settings file.
    pub setup_vars: PathBuf,
    /// Directory holding `<interface>.conf`.
    pub tunnel_dir: PathBuf,
    /// Directory holding the registry and per-client configs.
    pub configs_dir: PathBuf,
    /// Directory holding the key files.
    pub keys_dir: PathBuf,
    /// DNS host file.
    pub hosts_file: PathBuf,
    /// Domain appended to names in the host file.
    pub dns_suffix: String,
    /// Owner (uid, gid) given to key files; `None` leaves them as created.
    pub key_owner: Option<(u32, u32)>,
}

impl Default for Locations {
    fn default() -> Self {
        Self {
            interface: "wg0".to_string(),
            setup_vars: PathBuf::from("/etc/pivpn/wireguard/setupVars.conf"),
            tunnel_dir: PathBuf::from("/etc/wireguard"),
            configs_dir: PathBuf::from("/etc/wireguard/configs"),
            keys_dir: PathBuf::from("/etc/wireguard/keys"),
            hosts_file: PathBuf::from("/etc/pivpn/hosts.wireguard"),
            dns_suffix: "pivpn".to_string(),
            key_owner: Some((0, 0)),
        }
    }
}

impl Locations {
    /// Sets the interface name.
    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    /// Sets the setup vars file.
    #[must_use]
    pub fn with_setup_vars(mut self, path: impl Into<PathBuf>) -> Self {
        self.setup_vars = path.into();
        self
    }

    /// Sets the tunnel directory.
    #[must_use]
    pub fn with_tunnel_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.tunnel_dir = path.into();
        self
    }

    /// Sets the configs directory.
    #[must_use]
    pub fn with_configs_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.configs_dir = path.into();
        self
    }

    /// Sets the keys directory.
    #[must_use]
    pub fn with_keys_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.keys_dir = path.into();
        self
    }

    /// Sets the DNS host file.
    #[must_use]
    pub fn with_hosts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.hosts_file = path.into();
        self
    }

    /// Sets the DNS suffix.
    #[must_use]
    pub fn with_dns_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.dns_suffix = suffix.into();
        self
    }

    /// Sets the key file owner.
    #[must_use]
    pub fn with_key_owner(mut self, owner: Option<(u32, u32)>) -> Self {
        self.key_owner = owner;
        self
    }

    /// Path of the tunnel file.
    #[must_use]
    pub fn tunnel_file(&self) -> PathBuf {
        self.tunnel_dir.join(format!("{}.conf", self.interface))
    }

    /// Path of the client registry.
    #[must_use]
    pub fn registry_file(&self) -> PathBuf {
        self.configs_dir.join(REGISTRY_FILE)
    }

    /// Path of a client's configuration file.
    #[must_use]
    pub fn client_file(&self, name: &str) -> PathBuf {
        self.configs_dir.join(format!("{name}.conf"))
    }
}

struct State {
    server: Configuration,
    clients: Vec<Client>,
}

/// A loaded VPN: server configuration, clients and the files behind them.
pub struct Vpn {
    locations: Locations,
    settings: Settings,
    state: Mutex<State>,
}

impl Vpn {
    /// Loads settings from `locations.setup_vars`, then the rest of the state.
    ///
    /// # Errors
    ///
    /// See [`Vpn::load_with_settings`]; also fails if the setup vars cannot
    /// be read.
    pub fn load(locations: Locations) -> Result<Self> {
        let settings = Settings::load(&locations.setup_vars)?;
        Self::load_with_settings(locations, settings)
    }

    /// Loads the tunnel file, the registry and every client file.
    ///
    /// Every named peer of the tunnel must have exactly one registry entry
    /// and a client file whose key and IPv4 address match it, and every
    /// registry entry must belong to a tunnel peer. Clients are listed in
    /// tunnel order.
    ///
    /// # Errors
    ///
    /// Returns an I/O error for an unreadable file, a parse error for a
    /// malformed one, and [`VpnError::Inconsistent`] if the files disagree.
    pub fn load_with_settings(locations: Locations, settings: Settings) -> Result<Self> {
        let tunnel_file = locations.tunnel_file();
        let server = parse_config(&files::read(&tunnel_file)?, &locations.interface)?;
        let registry = parse_registry(&files::read(&locations.registry_file())?)?;

        let mut registered: HashMap<&str, &ClientInfo> = HashMap::with_capacity(registry.len());
        for info in &registry {
            if registered.insert(info.name.as_str(), info).is_some() {
                return Err(VpnError::Inconsistent(format!(
                    "client {} is listed more than once in {REGISTRY_FILE}",
                    info.name
                )));
            }
        }

        let mut clients: Vec<Client> = Vec::with_capacity(server.peers.len());
        for peer in &server.peers {
            let name = match peer.name.as_deref() {
                Some(name) if !name.is_empty() => name,
                _ => {
                    return Err(VpnError::Inconsistent(format!(
                        "peer {} in {} has no name",
                        peer.public_key,
                        tunnel_file.display()
                    )));
                }
            };
            let Some(info) = registered.remove(name) else {
                let why = if clients.iter().any(|c| c.name() == name) {
                    format!("peer {name} appears more than once in {}", tunnel_file.display())
                } else {
                    format!("client {name} not found in {REGISTRY_FILE}")
                };
                return Err(VpnError::Inconsistent(why));
            };

            let client_file = locations.client_file(name);
            let client = Client {
                config: parse_config(&files::read(&client_file)?, name)?,
                disabled: peer.disabled,
                created_at: info.created_at,
            };
            if client.public_key() != info.public_key {
                return Err(VpnError::Inconsistent(format!(
                    "key of {} does not match {REGISTRY_FILE}",
                    client_file.display()
                )));
            }
            let address = client.ipv4_address()?;
            if address != info.address {
                return Err(VpnError::Inconsistent(format!(
                    "address {address} of {} does not match {} in {REGISTRY_FILE}",
                    client_file.display(),
                    info.address
                )));
            }
            clients.push(client);
        }

        if let Some(orphan) = registry.iter().find(|i| registered.contains_key(i.name.as_str())) {
            return Err(VpnError::Inconsistent(format!(
                "client {} in {REGISTRY_FILE} has no peer in {}",
                orphan.name,
                tunnel_file.display()
            )));
        }

        info!(
            interface = %locations.interface,
            clients = clients.len(),
            "loaded vpn"
        );
        Ok(Self {
            locations,
            settings,
            state: Mutex::new(State { server, clients }),
        })
    }

    /// Interface name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.locations.interface
    }

    /// File locations.
    #[must_use]
    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    /// Installer settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Snapshot of the server configuration.
    #[must_use]
    pub fn server(&self) -> Configuration {
        self.state.lock().server.clone()
    }

    /// Snapshot of the clients, in tunnel order.
    #[must_use]
    pub fn clients(&self) -> Vec<Client> {
        self.state.lock().clients.clone()
    }

    /// Snapshot of one client.
    #[must_use]
    pub fn client(&self, name: &str) -> Option<Client> {
        self.state.lock().clients.iter().find(|c| c.name() == name).cloned()
    }

    /// Creates a client and writes everything that refers to it.
    ///
    /// Writes, in order: the client file, the key files, the registry, the
    /// tunnel file, the host file, and the user's copy of the client file.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::InvalidClientName`] or [`VpnError::ClientExists`]
    /// before touching any file, an allocation error if the subnet is full,
    /// and otherwise the first failing write.
    pub fn add_client(&self, name: &str) -> Result<Client> {
        validate_client_name(name)?;
        let mut state = self.state.lock();
        if state.clients.iter().any(|c| c.name() == name) {
            return Err(VpnError::ClientExists(name.to_string()));
        }

        let subnet = *state
            .server
            .interface
            .addresses
            .first()
            .ok_or(VpnError::MissingServerAddress)?;
        let mut allocator = AddressAllocator::new(subnet)?;
        for address in state.clients.iter().filter_map(Client::address) {
            allocator.reserve(address);
        }
        let address = allocator.allocate()?;

        let keys = ClientKeys::generate(name);
        let server_key = state.server.interface.private_key.public_key();
        let client = Client::provision(&keys, address, server_key, &self.settings);
        let exported = client.config.export();

        files::write(&self.locations.client_file(name), &exported, CONFIG_MODE)?;
        keys.write(&self.locations.keys_dir, self.locations.key_owner)?;

        state.clients.push(client.clone());
        self.sync_registry(&state)?;

        state.server.add_peer(client.to_peer()?)?;
        self.sync_tunnel(&state)?;
        self.sync_hosts(&state)?;

        files::write(&self.user_client_file(name), &exported, CONFIG_MODE)?;

        info!(client = name, address = %address.addr(), "client added");
        Ok(client)
    }

    /// Removes a client and deletes its files.
    ///
    /// Files that are already gone are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::ClientNotFound`] for an unknown name, and
    /// otherwise the first failing write or delete.
    pub fn remove_client(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        let Some(index) = state.clients.iter().position(|c| c.name() == name) else {
            return Err(VpnError::ClientNotFound(name.to_string()));
        };

        state.server.remove_peer(name)?;
        self.sync_tunnel(&state)?;

        state.clients.remove(index);
        self.sync_registry(&state)?;

        files::remove(&self.locations.client_file(name))?;
        files::remove(&self.user_client_file(name))?;
        ClientKeys::remove(&self.locations.keys_dir, name)?;

        self.sync_hosts(&state)?;

        info!(client = name, "client removed");
        Ok(())
    }

    /// Re-enables a disabled client.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::ClientNotFound`] for an unknown name, or the
    /// tunnel write failure.
    pub fn enable_client(&self, name: &str) -> Result<()> {
        self.set_disabled(name, false)
    }

    /// Disables a client, keeping it in the tunnel file as a commented-out
    /// block.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::ClientNotFound`] for an unknown name, or the
    /// tunnel write failure.
    pub fn disable_client(&self, name: &str) -> Result<()> {
        self.set_disabled(name, true)
    }

    fn set_disabled(&self, name: &str, disabled: bool) -> Result<()> {
        let mut state = self.state.lock();
        if !state.clients.iter().any(|c| c.name() == name) {
            return Err(VpnError::ClientNotFound(name.to_string()));
        }

        if disabled {
            state.server.disable_peer(name)?;
        } else {
            state.server.enable_peer(name)?;
        }
        for client in state.clients.iter_mut().filter(|c| c.name() == name) {
            client.disabled = disabled;
        }
        self.sync_tunnel(&state)?;

        if disabled {
            info!(client = name, "client disabled");
        } else {
            info!(client = name, "client enabled");
        }
        Ok(())
    }

    /// Rewrites the registry, the tunnel file and the host file from the
    /// in-memory state. Client files and keys are left alone.
    ///
    /// # Errors
    ///
    /// Returns the first failing write.
    pub fn sync(&self) -> Result<()> {
        let state = self.state.lock();
        self.sync_registry(&state)?;
        self.sync_tunnel(&state)?;
        self.sync_hosts(&state)?;
        info!(interface = %self.locations.interface, "synced vpn files");
        Ok(())
    }

    fn sync_tunnel(&self, state: &State) -> Result<()> {
        files::write(&self.locations.tunnel_file(), &state.server.export(), CONFIG_MODE)
    }

    fn sync_registry(&self, state: &State) -> Result<()> {
        let infos = state
            .clients
            .iter()
            .map(Client::info)
            .collect::<Result<Vec<_>>>()?;
        files::write(&self.locations.registry_file(), &export_registry(&infos), PUBLIC_MODE)
    }

    fn sync_hosts(&self, state: &State) -> Result<()> {
        let path = &self.locations.hosts_file;
        if !files::exists(path)? {
            warn!(path = %path.display(), "host file not present, skipping");
            return Ok(());
        }
        let server = state
            .server
            .interface
            .addresses
            .first()
            .ok_or(VpnError::MissingServerAddress)?
            .addr();
        let hosts = render_hosts(server, &state.clients, &self.locations.dns_suffix)?;
        files::write(path, &hosts, PUBLIC_MODE)
    }

    fn user_client_file(&self, name: &str) -> PathBuf {
        user_client_file(&self.settings.user_config_dir, name)
    }
}

fn user_client_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.conf"))
}
