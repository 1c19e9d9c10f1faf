//! Configuration documents and the tiered aggregate built from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single opaque configuration record.
///
/// No schema is imposed; consumers interpret the payload themselves.
pub type ConfigDocument = Value;

/// Source tier a document was retrieved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Bundled with the software distribution
    Package,
    /// Deployed onto the local filesystem
    Filesystem,
    /// Live documents in the shared store
    Database,
}

impl Tier {
    /// All tiers in slot order.
    pub const ALL: [Tier; 3] = [Tier::Package, Tier::Filesystem, Tier::Database];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Package => "package",
            Tier::Filesystem => "filesystem",
            Tier::Database => "database",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "package" | "pkg" => Some(Tier::Package),
            "filesystem" | "fs" => Some(Tier::Filesystem),
            "database" | "db" => Some(Tier::Database),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Documents from one load call, grouped by the tier they came from.
///
/// Produced whole by [`crate::aggregate::PrototypeConfig::load`]; there is no
/// way to modify it afterwards. Reloading yields a new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedConfiguration {
    package: Vec<ConfigDocument>,
    filesystem: Vec<ConfigDocument>,
    database: Vec<ConfigDocument>,
}

impl AggregatedConfiguration {
    pub(crate) fn new(
        package: Vec<ConfigDocument>,
        filesystem: Vec<ConfigDocument>,
        database: Vec<ConfigDocument>,
    ) -> Self {
        Self {
            package,
            filesystem,
            database,
        }
    }

    pub fn package(&self) -> &[ConfigDocument] {
        &self.package
    }

    pub fn filesystem(&self) -> &[ConfigDocument] {
        &self.filesystem
    }

    pub fn database(&self) -> &[ConfigDocument] {
        &self.database
    }

    /// Documents held in the slot for `tier`.
    pub fn tier(&self, tier: Tier) -> &[ConfigDocument] {
        match tier {
            Tier::Package => &self.package,
            Tier::Filesystem => &self.filesystem,
            Tier::Database => &self.database,
        }
    }

    /// Iterate every document with its tier, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, &ConfigDocument)> {
        Tier::ALL
            .into_iter()
            .flat_map(move |tier| self.tier(tier).iter().map(move |doc| (tier, doc)))
    }

    /// Total number of documents across all tiers.
    pub fn len(&self) -> usize {
        self.package.len() + self.filesystem.len() + self.database.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
