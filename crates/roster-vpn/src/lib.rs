//! # roster-vpn
//!
//! Client management for a PiVPN-style `WireGuard` server.
//!
//! A server keeps its clients in four places: the tunnel configuration, a
//! flat registry (`clients.txt`) with one configuration file per client, the
//! client key files, and an optional DNS host file. [`Vpn`] loads and
//! cross-checks all of them, and adds, removes, enables or disables clients
//! while keeping them consistent.
//!
//! ```text
//! setupVars.conf ──► Settings ─┐
//! wg0.conf ────────────────────┼──► Vpn ──► add / remove / enable / disable / sync
//! clients.txt + <name>.conf ───┘
//! ```

pub mod allocator;
pub mod client;
pub mod error;
mod files;
pub mod hosts;
pub mod keys;
pub mod registry;
pub mod settings;
pub mod vpn;

pub use allocator::AddressAllocator;
pub use client::{validate_client_name, Client};
pub use error::{Result, VpnError};
pub use keys::ClientKeys;
pub use registry::{export_registry, parse_registry, ClientInfo};
pub use settings::Settings;
pub use vpn::{Locations, Vpn};
