//! Per-client key files.
//!
//! Each client has three files in the keys directory, `<name>_priv`,
//! `<name>_pub` and `<name>_psk`, each holding the bare base64 text of one
//! key.

use std::path::{Path, PathBuf};

use roster_wireguard::Key;

use crate::error::{Result, VpnError};
use crate::files;

/// Key material of one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKeys {
    /// Client name, used as the file name stem.
    pub name: String,
    /// Client private key.
    pub private_key: Key,
    /// Key shared between this client and the server only.
    pub preshared_key: Key,
}

impl ClientKeys {
    /// Generates a fresh private key and preshared key.
    #[must_use]
    pub fn generate(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            private_key: Key::generate_private(),
            preshared_key: Key::generate_preshared(),
        }
    }

    /// Public key derived from the private key.
    #[must_use]
    pub fn public_key(&self) -> Key {
        self.private_key.public_key()
    }

    /// Paths of the private, public and preshared key files.
    #[must_use]
    pub fn paths(dir: &Path, name: &str) -> [PathBuf; 3] {
        ["_priv", "_pub", "_psk"].map(|suffix| dir.join(format!("{name}{suffix}")))
    }

    /// Writes the three key files with owner-only permissions and hands them
    /// to `owner` when one is given.
    ///
    /// # Errors
    ///
    /// Returns an I/O error naming the first file that could not be written
    /// or chowned.
    pub fn write(&self, dir: &Path, owner: Option<(u32, u32)>) -> Result<()> {
        let [private, public, preshared] = Self::paths(dir, &self.name);
        for (path, key) in [
            (private, self.private_key),
            (public, self.public_key()),
            (preshared, self.preshared_key),
        ] {
            files::write(&path, &key.to_base64(), files::KEY_MODE)?;
            files::chown(&path, owner)?;
        }
        Ok(())
    }

    /// Reads a client's private and preshared key files.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a file is unreadable, or
    /// [`VpnError::InvalidKeyFile`] if it does not hold a key.
    pub fn read(dir: &Path, name: &str) -> Result<Self> {
        let [private, _, preshared] = Self::paths(dir, name);
        Ok(Self {
            name: name.to_string(),
            private_key: read_key(&private)?,
            preshared_key: read_key(&preshared)?,
        })
    }

    /// Deletes a client's key files. Files already gone are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first deletion failure other than not-found.
    pub fn remove(dir: &Path, name: &str) -> Result<()> {
        for path in Self::paths(dir, name) {
            files::remove(&path)?;
        }
        Ok(())
    }
}

fn read_key(path: &Path) -> Result<Key> {
    let text = files::read(path)?;
    Key::from_base64(text.trim()).map_err(|source| VpnError::InvalidKeyFile {
        path: path.to_path_buf(),
        source,
    })
}
