//! DNS host file for the local resolver.
//!
//! One `<address> <name>.<suffix>` line per host: the server first, then each
//! client in list order.

use std::fmt::Write as FmtWrite;
use std::net::IpAddr;

use crate::client::{Client, RESERVED_NAME};
use crate::error::{Result, VpnError};

/// Renders the host file for a server address and its clients.
///
/// # Errors
///
/// Returns [`VpnError::Inconsistent`] if a client has no address.
pub fn render_hosts(server: IpAddr, clients: &[Client], suffix: &str) -> Result<String> {
    let mut output = String::new();
    let _ = writeln!(output, "{server} {RESERVED_NAME}.{suffix}");
    for client in clients {
        let address = client.address().ok_or_else(|| {
            VpnError::Inconsistent(format!("client {} has no address", client.name()))
        })?;
        let _ = writeln!(output, "{address} {}.{suffix}", client.dns_name());
    }
    Ok(output)
}
