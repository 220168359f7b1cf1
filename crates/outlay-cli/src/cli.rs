//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Outlay - See where the money went
#[derive(Parser)]
#[command(name = "outlay")]
#[command(about = "Expense ledger analyzer: daily totals, categories, spikes and forecast", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Pipeline config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze an expense ledger CSV
    Analyze {
        /// Ledger CSV (needs Date and Amount columns, plus Category or Description)
        #[arg(short, long)]
        file: PathBuf,

        /// Output format: text, json, csv
        #[arg(long, default_value = "text")]
        format: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Forecast horizon in days (overrides config)
        #[arg(long)]
        horizon: Option<u32>,

        /// Number of categories shown before merging into Others (overrides config)
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Show the effective pipeline configuration
    Config,
}
