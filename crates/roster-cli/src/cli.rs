//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use roster_vpn::Locations;

/// Roster - manage the clients of a PiVPN-style `WireGuard` server.
#[derive(Parser, Debug, Clone)]
#[command(name = "roster")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Tunnel interface name.
    #[arg(long, env = "ROSTER_INTERFACE", default_value = "wg0")]
    pub interface: String,

    /// Installer settings file.
    #[arg(long, env = "ROSTER_SETUP_VARS", default_value = "/etc/pivpn/wireguard/setupVars.conf")]
    pub setup_vars: PathBuf,

    /// Directory holding `<interface>.conf`.
    #[arg(long, env = "ROSTER_TUNNEL_DIR", default_value = "/etc/wireguard")]
    pub tunnel_dir: PathBuf,

    /// Directory holding `clients.txt` and the client configs.
    #[arg(long, env = "ROSTER_CONFIGS_DIR", default_value = "/etc/wireguard/configs")]
    pub configs_dir: PathBuf,

    /// Directory holding the client key files.
    #[arg(long, env = "ROSTER_KEYS_DIR", default_value = "/etc/wireguard/keys")]
    pub keys_dir: PathBuf,

    /// DNS host file, updated only if it exists.
    #[arg(long, env = "ROSTER_HOSTS_FILE", default_value = "/etc/pivpn/hosts.wireguard")]
    pub hosts_file: PathBuf,

    /// Domain appended to client names in the host file.
    #[arg(long, env = "ROSTER_DNS_SUFFIX", default_value = "pivpn")]
    pub dns_suffix: String,

    /// Leave key files owned by the current user instead of root.
    #[arg(long, env = "ROSTER_NO_CHOWN")]
    pub no_chown: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// File locations selected by the flags.
    #[must_use]
    pub fn locations(&self) -> Locations {
        Locations::default()
            .with_interface(&self.interface)
            .with_setup_vars(&self.setup_vars)
            .with_tunnel_dir(&self.tunnel_dir)
            .with_configs_dir(&self.configs_dir)
            .with_keys_dir(&self.keys_dir)
            .with_hosts_file(&self.hosts_file)
            .with_dns_suffix(&self.dns_suffix)
            .with_key_owner(if self.no_chown { None } else { Some((0, 0)) })
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List clients.
    List,

    /// Create a client.
    Add {
        /// Client name: 1 to 15 of `[A-Za-z0-9.@_-]`, not all digits.
        name: String,
    },

    /// Remove a client and delete its files.
    Remove {
        /// Client name.
        name: String,
    },

    /// Re-enable a disabled client.
    Enable {
        /// Client name.
        name: String,
    },

    /// Disable a client without removing it.
    Disable {
        /// Client name.
        name: String,
    },

    /// Rewrite the registry, tunnel and host files from the loaded state.
    Sync,
}
