//! Direct file writes with explicit modes.
//!
//! Files are truncated and rewritten in place. The mode only applies when a
//! file is created; an existing file keeps its permissions.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, VpnError};

/// Mode for tunnel and per-client configuration files.
pub(crate) const CONFIG_MODE: u32 = 0o640;
/// Mode for the client registry and the DNS host file.
pub(crate) const PUBLIC_MODE: u32 = 0o644;
/// Mode for key files.
pub(crate) const KEY_MODE: u32 = 0o600;

pub(crate) fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| VpnError::io(path, e))
}

pub(crate) fn write(path: &Path, contents: &str, mode: u32) -> Result<()> {
    write_inner(path, contents, mode).map_err(|e| VpnError::io(path, e))?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

#[cfg(unix)]
fn write_inner(path: &Path, contents: &str, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_inner(path: &Path, contents: &str, _mode: u32) -> io::Result<()> {
    fs::File::create(path)?.write_all(contents.as_bytes())
}

/// Deletes a file; a file that is already gone counts as deleted.
pub(crate) fn remove(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed file");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(VpnError::io(path, e)),
    }
}

/// Hands the file to `owner` (uid, gid).
#[cfg(unix)]
pub(crate) fn chown(path: &Path, owner: Option<(u32, u32)>) -> Result<()> {
    let Some((uid, gid)) = owner else {
        return Ok(());
    };
    std::os::unix::fs::chown(path, Some(uid), Some(gid)).map_err(|e| VpnError::io(path, e))
}

#[cfg(not(unix))]
pub(crate) fn chown(_path: &Path, _owner: Option<(u32, u32)>) -> Result<()> {
    Ok(())
}

/// Returns whether `path` exists, surfacing errors other than not-found.
pub(crate) fn exists(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(VpnError::io(path, e)),
    }
}
