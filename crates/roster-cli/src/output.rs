//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use chrono::{DateTime, Utc};
use roster_vpn::Client;
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// One client in a listing.
#[derive(Debug, Clone, Serialize)]
pub struct ClientRow {
    /// Client name.
    pub name: String,
    /// Tunnel address, without prefix length.
    pub address: Option<String>,
    /// Base64 public key.
    pub public_key: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Whether the peer is commented out of the tunnel.
    pub disabled: bool,
}

impl From<&Client> for ClientRow {
    fn from(client: &Client) -> Self {
        Self {
            name: client.name().to_string(),
            address: client.address().map(|a| a.to_string()),
            public_key: client.public_key().to_base64(),
            created_at: client.created_at,
            disabled: client.disabled,
        }
    }
}

/// List of clients for display.
#[derive(Debug, Clone, Serialize)]
pub struct ClientList {
    /// Clients in tunnel order.
    pub clients: Vec<ClientRow>,
}

impl ClientList {
    /// Build a listing from loaded clients.
    #[must_use]
    pub fn new(clients: &[Client]) -> Self {
        Self {
            clients: clients.iter().map(ClientRow::from).collect(),
        }
    }
}

impl TableDisplay for ClientList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.clients.is_empty() {
            writeln!(writer, "No clients")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<15}  {:<15}  {:<44}  {:<20}  {:<8}",
            "NAME", "ADDRESS", "PUBLIC KEY", "CREATED", "STATUS"
        )?;
        writeln!(writer, "{}", "─".repeat(110))?;

        for client in &self.clients {
            writeln!(
                writer,
                "{:<15}  {:<15}  {:<44}  {:<20}  {:<8}",
                client.name,
                client.address.as_deref().unwrap_or("-"),
                client.public_key,
                client.created_at.format("%d %b %Y, %H:%M"),
                if client.disabled { "disabled" } else { "enabled" },
            )?;
        }

        let disabled = self.clients.iter().filter(|c| c.disabled).count();
        writeln!(writer)?;
        writeln!(
            writer,
            "Total: {} client(s), {disabled} disabled",
            self.clients.len()
        )?;
        Ok(())
    }
}

/// Simple message output.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
    /// Whether this is a success message.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// Create an informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.success {
            writeln!(writer, "✓ {}", self.message)?;
        } else {
            writeln!(writer, "{}", self.message)?;
        }
        Ok(())
    }
}
