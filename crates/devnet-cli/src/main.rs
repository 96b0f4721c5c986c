//! Command-line interface for the devnet device registry
//!
//! Every invocation opens the configured ledger file, runs one transaction
//! or query, and prints the affected record(s) as JSON on stdout. Logs go to
//! stderr.

use anyhow::Result;
use clap::Parser;
use devnet_core::config::DevnetConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::device::{handle_device_command, DeviceCommand};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "devnet")]
#[command(about = "Devnet - device identity registry with ownership lifecycle", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: DeviceCommand,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = ".devnet/config.toml")]
    config: PathBuf,

    /// Authenticated identity submitting the transaction
    #[arg(long, global = true)]
    caller: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(Some(&cli.config))?;

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let output = handle_device_command(cli.command, &config, cli.caller.as_deref()).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
