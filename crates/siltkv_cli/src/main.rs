//! siltkv CLI
//!
//! Command-line tools for siltkv store management.
//!
//! # Commands
//!
//! - `get`, `put`, `delete`, `inc` - Single-key transactions
//! - `scan` - List keys under a prefix
//! - `compact` - Rewrite the data log with live entries only
//! - `stats` - Display store metadata
//! - `encode-key` / `decode-key` - Inspect the key codec

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// siltkv command-line store tools.
#[derive(Parser)]
#[command(name = "siltkv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored under a key
    Get {
        /// Key to read
        key: String,
    },

    /// Store a value under a key
    Put {
        /// Key to write
        key: String,
        /// Value to store (must not be empty)
        value: String,
    },

    /// Delete a key
    Delete {
        /// Key to delete
        key: String,
    },

    /// Add to a decimal counter and print the new value
    Inc {
        /// Counter key
        key: String,

        /// Amount to add
        #[arg(short, long, default_value = "1", allow_hyphen_values = true)]
        step: i64,
    },

    /// List keys and values under a prefix
    Scan {
        /// Key prefix (empty lists everything)
        #[arg(default_value = "")]
        prefix: String,

        /// Maximum number of entries to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Rewrite the data log keeping only live entries
    Compact,

    /// Display store metadata
    Stats {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the hex encoding of typed literals (`i:-3 u:7 f:1.5 s:abc x:00ff null`)
    EncodeKey {
        /// Values of the key tuple, in order
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
    },

    /// Print the typed literals of a hex-encoded key
    DecodeKey {
        /// Hex-encoded key
        hex: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Get { key } => {
            let path = cli.path.ok_or("Store path required for get")?;
            commands::kv::get(&path, &key)?;
        }
        Commands::Put { key, value } => {
            let path = cli.path.ok_or("Store path required for put")?;
            commands::kv::put(&path, &key, &value)?;
        }
        Commands::Delete { key } => {
            let path = cli.path.ok_or("Store path required for delete")?;
            commands::kv::delete(&path, &key)?;
        }
        Commands::Inc { key, step } => {
            let path = cli.path.ok_or("Store path required for inc")?;
            commands::kv::inc(&path, &key, step)?;
        }
        Commands::Scan {
            prefix,
            limit,
            format,
        } => {
            let path = cli.path.ok_or("Store path required for scan")?;
            commands::scan::run(&path, &prefix, limit, &format)?;
        }
        Commands::Compact => {
            let path = cli.path.ok_or("Store path required for compact")?;
            commands::compact::run(&path)?;
        }
        Commands::Stats { format } => {
            let path = cli.path.ok_or("Store path required for stats")?;
            commands::stats::run(&path, &format)?;
        }
        Commands::EncodeKey { values } => {
            println!("{}", commands::codec::encode(&values)?);
        }
        Commands::DecodeKey { hex } => {
            println!("{}", commands::codec::decode(&hex)?);
        }
        Commands::Version => {
            println!("siltkv CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("siltkv Core v{}", siltkv_core::VERSION);
        }
    }

    Ok(())
}
