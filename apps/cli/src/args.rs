use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parking tariff engine: price stays, manage rates and serve the JSON API.
#[derive(Debug, Parser)]
#[command(name = "tariff", version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding the database and the tariff defaults file
    #[arg(long, env = "TARIFF_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the JSON API on localhost
    Serve {
        /// Override the configured port for this run only
        #[arg(long)]
        port: Option<u16>,
    },
    /// Price a stay without recording a ticket
    Quote {
        /// Rate id to price the stay under
        #[arg(long)]
        rate: i64,
        /// Entry time, e.g. 2025-03-03T09:00
        #[arg(long)]
        entry: String,
        /// Exit time, e.g. 2025-03-03T11:30
        #[arg(long)]
        exit: String,
        /// Vehicle category; defaults to the rate's
        #[arg(long)]
        category: Option<String>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the stored tariffs to a defaults file
    ExportDefaults {
        /// Target file; defaults to the data dir's defaults file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}
