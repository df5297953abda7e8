//! Roster CLI entry point.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use roster_cli::{Cli, CliError, OutputFormat, commands};
use roster_vpn::Vpn;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let vpn = Vpn::load(cli.locations())?;
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();
    commands::execute(&vpn, &cli.command, &mut stdout, &format)
}
