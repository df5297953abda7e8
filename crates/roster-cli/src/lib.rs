//! # roster-cli
//!
//! Command-line front end for [`roster_vpn`]: one subcommand per client
//! operation, with table or JSON output.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format};
pub use error::CliError;
pub use output::{OutputFormat, TableDisplay};
