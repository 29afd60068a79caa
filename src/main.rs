mod commands;
mod input;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use wifijoin::wifi::WifiManager;

/// Scan, inspect and join Wi-Fi networks from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "wifijoin",
    about = "Scan, inspect and join Wi-Fi networks from the terminal.",
    long_about = None,
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List nearby networks, connected first and strongest next
    Scan,
    /// Show the currently connected network
    Status,
    /// Connect to a network, prompting for a password when one is needed
    Connect {
        ssid: String,
        /// Password for the network; prompted for interactively when omitted
        /// and the network has no saved profile
        #[arg(short, long)]
        password: Option<String>,
        /// Seconds to wait for the association before giving up
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Disconnect from a network
    Disconnect { ssid: String },
    /// List the profiles the operating system has saved
    Profiles,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let manager = WifiManager::for_platform();

    match args.command {
        Command::Scan => commands::scan(&manager),
        Command::Status => commands::status(&manager),
        Command::Connect {
            ssid,
            password,
            timeout,
        } => commands::connect(&manager, &ssid, password, timeout),
        Command::Disconnect { ssid } => commands::disconnect(&manager, &ssid),
        Command::Profiles => commands::profiles(&manager),
    }
}
