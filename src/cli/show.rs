//! Show subcommand: load every tier and print it.

use crate::aggregate::PrototypeConfig;
use crate::document::Tier;
use crate::format::{self, OutputFormat};
use anyhow::{Result, anyhow};
use clap::Args;
use tracing::info;

/// Arguments for the show subcommand
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Only print one tier: package, filesystem, or database
    #[arg(long, value_name = "TIER")]
    pub tier: Option<String>,

    /// Output format: json (default) or yaml
    #[arg(short, long, default_value = "json")]
    pub format: String,
}

impl Default for ShowArgs {
    fn default() -> Self {
        Self {
            tier: None,
            format: "json".to_string(),
        }
    }
}

impl ShowArgs {
    pub fn tier(&self) -> Result<Option<Tier>> {
        self.tier
            .as_deref()
            .map(|t| Tier::from_str(t).ok_or_else(|| anyhow!("unknown tier '{}'", t)))
            .transpose()
    }

    pub fn format(&self) -> Result<OutputFormat> {
        OutputFormat::from_str(&self.format)
            .ok_or_else(|| anyhow!("unknown output format '{}'", self.format))
    }
}

/// Load configuration and render it.
pub fn run(config: &PrototypeConfig, args: &ShowArgs) -> Result<String> {
    let tier = args.tier()?;
    let output_format = args.format()?;

    let conf = config.load()?;
    info!("Loaded configuration: {}", format::summary(&conf));

    output_format.render(&format::select(&conf, tier))
}
