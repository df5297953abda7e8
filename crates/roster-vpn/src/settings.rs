//! Installer settings (`setupVars.conf`).
//!
//! The installer leaves a dotenv-style file of `key=value` pairs. Only a few
//! of them matter here: the public endpoint that clients dial, the DNS
//! resolvers handed to clients, and the home directory where a copy of each
//! client configuration is placed for the user.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use roster_wireguard::Endpoint;

use crate::error::{Result, VpnError};

/// Port used when the setup vars do not name one.
pub const DEFAULT_PORT: u16 = 51820;

const HOST_KEY: &str = "pivpnHOST";
const PORT_KEY: &str = "pivpnPORT";
const DNS_KEYS: [&str; 2] = ["pivpnDNS1", "pivpnDNS2"];
const INSTALL_HOME_KEY: &str = "install_home";

/// Parsed installer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Endpoint clients use to reach the server.
    pub endpoint: Endpoint,
    /// DNS resolvers handed to clients.
    pub dns: Vec<IpAddr>,
    /// Directory receiving the user-facing copy of each client config.
    pub user_config_dir: PathBuf,
    vars: HashMap<String, String>,
}

impl Settings {
    /// Builds settings from raw key/value pairs.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::Settings`] if `pivpnHOST` or `install_home` is
    /// missing, or if the port or a DNS entry does not parse.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> =
            vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

        let host = vars
            .get(HOST_KEY)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| missing(HOST_KEY))?;
        let port = match vars.get(PORT_KEY).filter(|p| !p.is_empty()) {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| VpnError::Settings(format!("{PORT_KEY}={port:?}: {e}")))?,
            None => DEFAULT_PORT,
        };

        let mut dns = Vec::with_capacity(DNS_KEYS.len());
        for key in DNS_KEYS {
            let Some(value) = vars.get(key).filter(|v| !v.is_empty()) else {
                continue;
            };
            let addr = value
                .parse::<IpAddr>()
                .map_err(|e| VpnError::Settings(format!("{key}={value:?}: {e}")))?;
            dns.push(addr);
        }

        let install_home = vars
            .get(INSTALL_HOME_KEY)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| missing(INSTALL_HOME_KEY))?;

        Ok(Self {
            endpoint: Endpoint::new(host.clone(), port),
            dns,
            user_config_dir: Path::new(install_home).join("configs"),
            vars,
        })
    }

    /// Reads settings from a dotenv-style file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error naming the file if it cannot be read, or
    /// [`VpnError::Settings`] if it is malformed or incomplete.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let vars = dotenvy::from_path_iter(path)
            .map_err(|e| setup_vars_error(path, e))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()
            .map_err(|e| setup_vars_error(path, e))?;
        Self::from_vars(vars)
    }

    /// Returns the raw value of any setup var.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

fn missing(key: &str) -> VpnError {
    VpnError::Settings(format!("{key} was not present in the setup vars"))
}

fn setup_vars_error(path: &Path, err: dotenvy::Error) -> VpnError {
    match err {
        dotenvy::Error::Io(source) => VpnError::io(path, source),
        other => VpnError::Settings(format!("{}: {other}", path.display())),
    }
}
