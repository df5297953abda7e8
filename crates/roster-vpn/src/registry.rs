//! The flat client registry (`clients.txt`).
//!
//! One client per line, four fixed-width fields separated by spaces: the name
//! left-justified in 15 columns, the base64 public key right-justified in 44,
//! then the creation time (seconds since the epoch) and the client's IPv4
//! address as a big-endian integer, each right-justified in 10.

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use roster_wireguard::Key;
use tracing::error;

use crate::error::{Result, VpnError};

/// File name of the registry inside the configs directory.
pub const REGISTRY_FILE: &str = "clients.txt";

/// Registry summary of one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client public key.
    pub public_key: Key,
    /// When the client was created, to the second.
    pub created_at: DateTime<Utc>,
    /// Address allocated to the client.
    pub address: Ipv4Addr,
}

impl ClientInfo {
    /// Parses a single registry line.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::Registry`] if the line does not have exactly four
    /// fields, or a field does not decode.
    pub fn parse_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [name, key, created, address] = fields[..] else {
            return Err(registry_error(
                line,
                format!("expected 4 fields, got {}", fields.len()),
            ));
        };

        let public_key = Key::from_base64(key)
            .map_err(|e| registry_error(line, format!("public key: {e}")))?;
        let created_at = created
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| registry_error(line, format!("invalid timestamp {created:?}")))?;
        let address = address
            .parse::<u32>()
            .map(Ipv4Addr::from)
            .map_err(|e| registry_error(line, format!("invalid decimal address: {e}")))?;

        Ok(Self {
            name: name.to_string(),
            public_key,
            created_at,
            address,
        })
    }

    /// Renders this entry as a registry line, including the newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{:<15} {:>44} {:>10} {:>10}\n",
            self.name,
            self.public_key.to_base64(),
            self.created_at.timestamp(),
            u32::from(self.address)
        )
    }
}

fn registry_error(line: &str, why: String) -> VpnError {
    error!(line, %why, "invalid line in clients.txt");
    VpnError::Registry {
        line: line.to_string(),
        why,
    }
}

/// Parses a whole registry. Blank lines are skipped.
///
/// # Errors
///
/// Returns the error of the first malformed line.
pub fn parse_registry(input: &str) -> Result<Vec<ClientInfo>> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(ClientInfo::parse_line)
        .collect()
}

/// Renders a registry in list order.
#[must_use]
pub fn export_registry(clients: &[ClientInfo]) -> String {
    clients.iter().fold(String::new(), |mut out, info| {
        out.push_str(&info.to_line());
        out
    })
}
