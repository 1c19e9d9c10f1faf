//! CLI command definitions for prototype-config
//!
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod import;
pub mod scan;
pub mod show;

use clap::{Parser, Subcommand};
use import::ImportArgs;
use scan::ScanArgs;
use show::ShowArgs;

/// Inspect and seed tiered node configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the loader settings file (overrides PROTOTYPE_SETTINGS_PATH)
    #[arg(short, long, global = true)]
    pub settings: Option<String>,

    /// Path to the document store (overrides settings)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Local configuration directory (overrides settings)
    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load all tiers and print the result (default if no subcommand given)
    Show(ShowArgs),

    /// Scan a single directory for configuration files
    Scan(ScanArgs),

    /// Insert configuration documents into the shared store
    Import(ImportArgs),
}
