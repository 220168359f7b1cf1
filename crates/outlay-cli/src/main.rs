//! Outlay CLI - Expense ledger analyzer
//!
//! Usage:
//!   outlay analyze --file expenses.csv              Print a spending summary
//!   outlay analyze --file expenses.csv --format json --out report.json
//!   outlay config                                   Show effective configuration

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Analyze {
            file,
            format,
            out,
            horizon,
            top_k,
        } => commands::cmd_analyze(
            cli.config.as_deref(),
            &file,
            &format,
            out.as_deref(),
            horizon,
            top_k,
        ),
        Commands::Config => commands::cmd_config(cli.config.as_deref()),
    }
}
