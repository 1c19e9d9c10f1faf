//! Import subcommand for prototype-config CLI
//!
//! Reads a JSON file and inserts its documents into the `Configuration`
//! collection, stamping them so the database tier picks them up.

use crate::document::ConfigDocument;
use crate::fetcher::{CONFIGURATION_COLLECTION, PROTOTYPE_CONFIG_TYPE};
use crate::scanner::parse_document;
use crate::store::SqliteStore;
use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the import subcommand
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON file holding one document or an array of documents
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Store the documents with `active: false`
    #[arg(long)]
    pub inactive: bool,

    /// Domain tag written to the `type` field
    #[arg(long = "type", default_value = PROTOTYPE_CONFIG_TYPE)]
    pub doc_type: String,

    /// Validate and print the documents without writing them
    #[arg(long)]
    pub dry_run: bool,
}

impl ImportArgs {
    /// Parse the input file into stamped documents.
    pub fn documents(&self) -> Result<Vec<ConfigDocument>> {
        let content = std::fs::read_to_string(&self.file)
            .with_context(|| format!("failed to read {}", self.file.display()))?;
        let parsed = parse_document(&content)
            .map_err(|reason| anyhow::anyhow!("{}: {}", self.file.display(), reason))?;

        let docs = match parsed {
            Value::Array(items) => items,
            single => vec![single],
        };
        docs.into_iter().map(|doc| self.stamp(doc)).collect()
    }

    fn stamp(&self, doc: ConfigDocument) -> Result<ConfigDocument> {
        let Value::Object(mut map) = doc else {
            bail!("configuration documents must be JSON objects");
        };
        map.insert("active".to_string(), Value::Bool(!self.inactive));
        map.insert("type".to_string(), Value::String(self.doc_type.clone()));
        Ok(Value::Object(map))
    }
}

/// Insert the file's documents, returning how many were written.
pub fn run(store: &SqliteStore, args: &ImportArgs) -> Result<usize> {
    let docs = args.documents()?;
    if args.dry_run {
        info!(count = docs.len(), "Dry run, nothing written");
        return Ok(0);
    }
    for doc in &docs {
        let id = store.insert(CONFIGURATION_COLLECTION, doc)?;
        info!(id, "Imported configuration document");
    }
    Ok(docs.len())
}
