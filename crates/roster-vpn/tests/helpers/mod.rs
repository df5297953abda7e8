//! Shared fixtures: a throwaway PiVPN-style installation in a temp directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use roster_vpn::{Client, ClientInfo, ClientKeys, Locations, Settings, Vpn};
use roster_wireguard::{Configuration, Key};
use tempfile::TempDir;

/// A temp directory laid out like an installed server with no clients.
pub struct Fixture {
    pub dir: TempDir,
    pub locations: Locations,
    pub user_dir: PathBuf,
    pub server_key: Key,
    pub server: Configuration,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_server_address("10.6.0.1/24")
    }

    pub fn with_server_address(address: &str) -> Self {
        let dir = TempDir::new().expect("fixture");
        let root = dir.path();

        let tunnel_dir = root.join("wireguard");
        let configs_dir = tunnel_dir.join("configs");
        let keys_dir = tunnel_dir.join("keys");
        let pivpn_dir = root.join("pivpn");
        let home = root.join("home").join("pi");
        let user_dir = home.join("configs");
        for d in [&configs_dir, &keys_dir, &pivpn_dir, &user_dir] {
            fs::create_dir_all(d).expect("fixture");
        }

        let setup_vars = pivpn_dir.join("setupVars.conf");
        fs::write(
            &setup_vars,
            format!(
                "pivpnHOST=vpn.example.com\npivpnPORT=51820\npivpnDNS1=10.6.0.1\ninstall_home={}\n",
                home.display()
            ),
        )
        .expect("fixture");

        let hosts_file = pivpn_dir.join("hosts.wireguard");
        fs::write(&hosts_file, "").expect("fixture");

        let server_key = Key::generate_private();
        let mut server = Configuration::new("wg0", server_key);
        server.interface.listen_port = 51820;
        server.interface.addresses.push(address.parse().expect("fixture"));
        fs::write(tunnel_dir.join("wg0.conf"), server.export()).expect("fixture");
        fs::write(configs_dir.join("clients.txt"), "").expect("fixture");

        let locations = Locations::default()
            .with_setup_vars(setup_vars)
            .with_tunnel_dir(tunnel_dir)
            .with_configs_dir(configs_dir)
            .with_keys_dir(keys_dir)
            .with_hosts_file(hosts_file)
            .with_key_owner(None);

        Self {
            dir,
            locations,
            user_dir,
            server_key,
            server,
        }
    }

    pub fn load(&self) -> Vpn {
        Vpn::load(self.locations.clone()).expect("fixture")
    }

    pub fn settings(&self) -> Settings {
        Settings::load(&self.locations.setup_vars).expect("fixture")
    }

    pub fn read(path: &Path) -> String {
        fs::read_to_string(path).expect("fixture")
    }

    pub fn tunnel_text(&self) -> String {
        Self::read(&self.locations.tunnel_file())
    }

    pub fn registry_text(&self) -> String {
        Self::read(&self.locations.registry_file())
    }

    pub fn hosts_text(&self) -> String {
        Self::read(&self.locations.hosts_file)
    }

    pub fn user_file(&self, name: &str) -> PathBuf {
        self.user_dir.join(format!("{name}.conf"))
    }

    /// Writes a client file as an earlier run would have, without touching
    /// the tunnel or the registry.
    pub fn write_client(&self, name: &str, address: &str) -> Client {
        let keys = ClientKeys::generate(name);
        let client = Client::provision(
            &keys,
            address.parse().expect("fixture"),
            self.server_key.public_key(),
            &self.settings(),
        );
        fs::write(self.locations.client_file(name), client.config.export()).expect("fixture");
        client
    }

    pub fn write_registry(&self, clients: &[&Client]) {
        let infos: Vec<ClientInfo> = clients.iter().map(|c| c.info().expect("fixture")).collect();
        fs::write(self.locations.registry_file(), roster_vpn::export_registry(&infos)).expect("fixture");
    }

    pub fn write_tunnel(&self, text: &str) {
        fs::write(self.locations.tunnel_file(), text).expect("fixture");
    }
}
