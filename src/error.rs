//! Error types for configuration loading.
//!
//! Per-file parse failures never appear here: the scanner absorbs them.
//! Everything below is a tier-level or setup failure that reaches the caller.

use crate::document::Tier;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Filesystem scan failure for a whole directory.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot access configuration directory {}: {source}", path.display())]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Document-store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] refinery::Error),

    #[error("failed to encode document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("stored document {id} is not valid JSON: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("document store connection lock poisoned")]
    Poisoned,

    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

/// Loader settings could not be read or resolved.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("setting [{section}] {key} is not configured")]
    Missing { section: String, key: String },
}

/// What went wrong in a failed tier.
#[derive(Debug, Error)]
pub enum TierErrorKind {
    #[error(transparent)]
    DirectoryAccess(#[from] ScanError),

    #[error(transparent)]
    DataSource(#[from] StoreError),
}

/// A failure attributed to exactly one tier.
#[derive(Debug, Error)]
#[error("{tier} tier failed: {kind}")]
pub struct TierFailure {
    pub tier: Tier,
    #[source]
    pub kind: TierErrorKind,
}

impl TierFailure {
    pub fn new(tier: Tier, kind: impl Into<TierErrorKind>) -> Self {
        Self {
            tier,
            kind: kind.into(),
        }
    }

    pub fn is_directory_access(&self) -> bool {
        matches!(self.kind, TierErrorKind::DirectoryAccess(_))
    }

    pub fn is_data_source(&self) -> bool {
        matches!(self.kind, TierErrorKind::DataSource(_))
    }
}

/// Failure of a whole load call. No partial result accompanies it.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The local configuration directory could not be resolved; no tier ran.
    #[error("cannot resolve local configuration directory: {0}")]
    Settings(#[from] SettingsError),

    /// One or more tiers failed. Every failing tier is listed.
    #[error("{}", TierList(.0))]
    Tiers(Vec<TierFailure>),
}

impl LoadError {
    /// Tiers that failed, in slot order. Empty for settings failures.
    pub fn failed_tiers(&self) -> Vec<Tier> {
        match self {
            LoadError::Settings(_) => Vec::new(),
            LoadError::Tiers(failures) => failures.iter().map(|f| f.tier).collect(),
        }
    }

    /// The failure recorded for `tier`, if any.
    pub fn failure(&self, tier: Tier) -> Option<&TierFailure> {
        match self {
            LoadError::Settings(_) => None,
            LoadError::Tiers(failures) => failures.iter().find(|f| f.tier == tier),
        }
    }
}

struct TierList<'a>(&'a [TierFailure]);

impl fmt::Display for TierList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}
