//! Error types for VPN client management.

use std::io;
use std::path::{Path, PathBuf};

use ipnet::IpNet;
use roster_wireguard::WireGuardError;
use thiserror::Error;

/// Errors that can occur while loading or mutating the VPN state.
#[derive(Debug, Error)]
pub enum VpnError {
    /// A configuration file failed to parse or a peer mutation was refused.
    #[error(transparent)]
    WireGuard(#[from] WireGuardError),

    /// Reading, writing or deleting a file failed.
    #[error("error with file {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A key file holds something other than a base64 key.
    #[error("invalid key file {}: {source}", path.display())]
    InvalidKeyFile {
        /// The key file.
        path: PathBuf,
        /// Why the key was rejected.
        #[source]
        source: WireGuardError,
    },

    /// The setup vars are missing a required entry or hold a bad value.
    #[error("invalid setup vars: {0}")]
    Settings(String),

    /// A line of the client registry is malformed.
    #[error("invalid line in clients.txt ({why}): {line:?}")]
    Registry {
        /// The offending line.
        line: String,
        /// What is wrong with it.
        why: String,
    },

    /// A client name was refused.
    #[error("invalid client name {name:?}: {reason}")]
    InvalidClientName {
        /// The refused name.
        name: String,
        /// The rule it breaks.
        reason: String,
    },

    /// A client with the name already exists.
    #[error("client with this name already exists: {0}")]
    ClientExists(String),

    /// No client has the name.
    #[error("client not found: {0}")]
    ClientNotFound(String),

    /// The server interface has no address to allocate from.
    #[error("server interface has no address")]
    MissingServerAddress,

    /// Client addresses can only be allocated from an IPv4 server prefix.
    #[error("cannot allocate client addresses from {0}: not an IPv4 prefix")]
    UnsupportedServerAddress(IpNet),

    /// Every usable address of the tunnel subnet is taken.
    #[error("unable to add client: no usable addresses left in {0}")]
    AddressExhausted(IpNet),

    /// The tunnel file, registry and client files disagree.
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
}

impl VpnError {
    /// Wraps an I/O error with the path it concerns.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns true if this is an I/O error for a file that does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Result type for VPN operations.
pub type Result<T> = std::result::Result<T, VpnError>;
