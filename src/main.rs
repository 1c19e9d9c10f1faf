//! prototype-config
//!
//! Loads node configuration from the package, local filesystem and shared
//! store tiers, and seeds the store with new documents.

use anyhow::{Context, Result};
use clap::Parser;
use prototype_config::aggregate::PrototypeConfig;
use prototype_config::cli::{Cli, Command, import, scan, show};
use prototype_config::logging::{self, LogTarget};
use prototype_config::settings::{
    CONFIGURATION_SECTION, DATABASE_SECTION, DIR_KEY, PATH_KEY, Settings,
};
use prototype_config::store::SqliteStore;
use std::sync::Arc;
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), logging::level_for(cli.verbose))?;

    // If explicit settings path given, set it as env var for Settings to pick up
    // SAFETY: This is safe at program startup before any other threads are spawned
    if let Some(settings_path) = &cli.settings {
        unsafe {
            std::env::set_var("PROTOTYPE_SETTINGS_PATH", settings_path);
        }
    }
    let mut settings = Settings::load()?;

    // Override from CLI arguments
    if let Some(db_path) = &cli.database {
        settings.set(DATABASE_SECTION, PATH_KEY, db_path.as_str());
    }
    if let Some(config_dir) = &cli.config_dir {
        settings.set(CONFIGURATION_SECTION, DIR_KEY, config_dir.as_str());
    }
    if let Some(path) = settings.source_path() {
        debug!("Settings file: {:?}", path);
    }

    let command = cli
        .command
        .unwrap_or_else(|| Command::Show(show::ShowArgs::default()));

    match command {
        Command::Scan(args) => {
            println!("{}", scan::run(&args)?);
        }
        Command::Show(args) => {
            let store = open_store(&settings)?;
            let config = PrototypeConfig::new(Arc::new(settings), Arc::new(store));
            println!("{}", show::run(&config, &args)?);
        }
        Command::Import(args) => {
            let store = open_store(&settings)?;
            let count = import::run(&store, &args)?;
            println!("Imported {} document(s)", count);
        }
    }

    Ok(())
}

/// Open the document store named in settings, creating its directory.
fn open_store(settings: &Settings) -> Result<SqliteStore> {
    let db_path = settings
        .db_path()
        .context("no document store path configured")?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!("Document store: {:?}", db_path);
    SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open document store {}", db_path.display()))
}
