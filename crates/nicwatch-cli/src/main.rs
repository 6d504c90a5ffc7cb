//! nicwatch - passive local-network device discovery from the terminal.
//!
//! Listens to broadcast and multicast chatter (ARP, DHCP, SSDP, IP) and
//! builds a per-device inventory keyed by hardware address, either live from
//! network interfaces or from a recorded pcap file.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use cli::{Cli, Commands};
use error::{exit_codes, CliError};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.pipeline_config();
    config.validate()?;

    match cli.command {
        Commands::List => commands::run_list(cli.json),
        Commands::Monitor(args) => commands::run_monitor(args, config, cli.json).await,
        Commands::Simulate(args) => commands::run_simulate(args, config, cli.json).await,
    }
}
