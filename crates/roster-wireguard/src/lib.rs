//! `WireGuard` configuration codec for roster.
//!
//! This crate parses and exports `wg-quick` style configuration files,
//! including the `#[disabled] ` convention that keeps a peer's block in the
//! file while commenting it out, and provides name-addressed peer mutations.

mod actions;
pub mod config;
pub mod error;
mod keys;
mod parse;
pub mod types;

pub use config::{Configuration, Interface, Peer, DISABLED_PREFIX};
pub use error::{Result, WireGuardError};
pub use keys::{Key, KEY_SIZE};
pub use parse::parse_config;
pub use types::{parse_prefix, Endpoint};
