//! Command execution against a loaded [`Vpn`].

use std::io::Write;

use roster_vpn::Vpn;
use tracing::debug;

use crate::cli::Commands;
use crate::error::CliError;
use crate::output::{ClientList, Message, OutputFormat};

/// Runs one subcommand and writes its result.
///
/// # Errors
///
/// Returns an error if the operation fails or the output cannot be written.
pub fn execute<W: Write>(
    vpn: &Vpn,
    command: &Commands,
    writer: &mut W,
    format: &OutputFormat,
) -> Result<(), CliError> {
    debug!(?command, interface = vpn.name(), "executing command");

    match command {
        Commands::List => {
            let list = ClientList::new(&vpn.clients());
            format.write(writer, &list)
        }
        Commands::Add { name } => {
            let client = vpn.add_client(name)?;
            let address = client
                .address()
                .map_or_else(|| "-".to_string(), |a| a.to_string());
            let path = vpn.locations().client_file(client.name());
            format.write(
                writer,
                &Message::success(format!(
                    "Client '{name}' added with address {address}, config at {}",
                    path.display()
                )),
            )
        }
        Commands::Remove { name } => {
            vpn.remove_client(name)?;
            format.write(writer, &Message::success(format!("Client '{name}' removed")))
        }
        Commands::Enable { name } => set_disabled(vpn, name, false, writer, format),
        Commands::Disable { name } => set_disabled(vpn, name, true, writer, format),
        Commands::Sync => {
            vpn.sync()?;
            let count = vpn.clients().len();
            format.write(
                writer,
                &Message::success(format!("Synchronized {count} client(s)")),
            )
        }
    }
}

fn set_disabled<W: Write>(
    vpn: &Vpn,
    name: &str,
    disabled: bool,
    writer: &mut W,
    format: &OutputFormat,
) -> Result<(), CliError> {
    let state = if disabled { "disabled" } else { "enabled" };
    if vpn.client(name).is_some_and(|c| c.disabled == disabled) {
        let message = Message::info(format!("Client '{name}' is already {state}"));
        return format.write(writer, &message);
    }

    if disabled {
        vpn.disable_client(name)?;
    } else {
        vpn.enable_client(name)?;
    }
    format.write(writer, &Message::success(format!("Client '{name}' {state}")))
}
