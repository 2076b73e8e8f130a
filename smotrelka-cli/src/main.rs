//! Smotrelka CLI - Command-line interface
//!
//! Runs consolidated title searches from the terminal or starts the JSON API.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use smotrelka_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "smotrelka")]
#[command(about = "Search a multi-provider title catalog, one record per title")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,

    /// Console log level (RUST_LOG overrides it)
    #[arg(long, value_enum, default_value_t = CliLogLevel::Warn, global = true)]
    log_level: CliLogLevel,

    /// Directory for the full debug log of this run
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())?;

    commands::handle_command(cli.command).await
}
