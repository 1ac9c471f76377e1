//! mapkv CLI
//!
//! Command-line tools for mapkv region files.
//!
//! # Commands
//!
//! - `inspect` - Display sizes and page alignment of a region file
//! - `grow` - Grow a region file to at least a given size
//! - `trim` - Shrink a region file after compaction
//! - `dump` - Hex dump the content of a region file

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// mapkv command-line region tools.
#[derive(Parser)]
#[command(name = "mapkv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the region file
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
    /// Display sizes and page alignment of a region file
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Grow a region file to at least SIZE bytes
    Grow {
        /// Target size in bytes (rounded up to a page)
        size: usize,
    },

    /// Shrink a region file to SIZE bytes (rounded up to a page)
    Trim {
        /// Target size in bytes
        size: usize,
    },

    /// Hex dump the content of a region file
    Dump {
        /// Start from this offset
        #[arg(short, long, default_value = "0")]
        offset: usize,

        /// Maximum number of bytes to dump
        #[arg(short, long, default_value = "256")]
        limit: usize,
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
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Region path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Grow { size } => {
            let path = cli.path.ok_or("Region path required for grow")?;
            commands::resize::grow(&path, size)?;
        }
        Commands::Trim { size } => {
            let path = cli.path.ok_or("Region path required for trim")?;
            commands::resize::trim(&path, size)?;
        }
        Commands::Dump { offset, limit } => {
            let path = cli.path.ok_or("Region path required for dump")?;
            commands::dump::run(&path, offset, limit)?;
        }
        Commands::Version => {
            println!("mapkv CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("page size: {} bytes", mapkv_region::page_size());
        }
    }

    Ok(())
}
