//! Error types for the CLI.

use roster_vpn::VpnError;
use thiserror::Error;

/// Errors that can occur during CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Loading or changing the VPN state failed.
    #[error(transparent)]
    Vpn(#[from] VpnError),

    /// Output formatting failed.
    #[error("format error: {0}")]
    Format(String),

    /// Writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
