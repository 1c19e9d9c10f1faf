//! Scan subcommand: run the filesystem scanner on one directory.

use crate::format::OutputFormat;
use crate::scanner::{FileOutcome, find_config_files, load_file};
use anyhow::{Result, anyhow};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

/// Arguments for the scan subcommand
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory to scan recursively
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Also list files that were skipped and why
    #[arg(long)]
    pub report: bool,

    /// Output format: json (default) or yaml
    #[arg(short, long, default_value = "json")]
    pub format: String,
}

/// Scan the directory and render the parsed documents.
///
/// With `--report`, each file is listed with its outcome instead.
pub fn run(args: &ScanArgs) -> Result<String> {
    let output_format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| anyhow!("unknown output format '{}'", args.format))?;

    let outcomes: Vec<(PathBuf, FileOutcome)> = find_config_files(&args.dir)?
        .into_iter()
        .map(|path| {
            let outcome = load_file(&path);
            (path, outcome)
        })
        .collect();

    if args.report {
        let report: Vec<_> = outcomes
            .iter()
            .map(|(path, outcome)| match outcome {
                FileOutcome::Parsed(_) => json!({"path": path, "status": "parsed"}),
                FileOutcome::Skipped { reason, .. } => {
                    json!({"path": path, "status": "skipped", "reason": reason})
                }
            })
            .collect();
        return output_format.render(&report);
    }

    let documents: Vec<_> = outcomes
        .into_iter()
        .filter_map(|(_, outcome)| outcome.into_document())
        .collect();
    output_format.render(&documents)
}
