//! Settings for the configuration loader itself.
//!
//! Resolved in layers, lowest priority first:
//! 1. **Defaults** - derived from the node home directory
//! 2. **User file** - `<home>/settings.yaml`, or `PROTOTYPE_SETTINGS_PATH`
//! 3. **Environment** - `PROTOTYPE_CONFIG_DIR`, `PROTOTYPE_DB_PATH`
//!
//! ## Environment Variables
//! - `PROTOTYPE_HOME` - Node home directory (default: `~/.prototype`)
//! - `PROTOTYPE_SETTINGS_PATH` - Explicit settings file (replaces the user file)
//! - `PROTOTYPE_CONFIG_DIR` - Local configuration directory
//! - `PROTOTYPE_DB_PATH` - Document store path

mod loader;
mod merge;

pub use loader::{Settings, SettingsPaths};
pub use merge::{deep_merge, deep_merge_all};

use std::collections::BTreeMap;

/// Section holding the local configuration directory.
pub const CONFIGURATION_SECTION: &str = "Configuration";
/// Key under [`CONFIGURATION_SECTION`] naming the directory.
pub const DIR_KEY: &str = "dir";
/// Section holding the document store location.
pub const DATABASE_SECTION: &str = "Database";
/// Key under [`DATABASE_SECTION`] naming the store path.
pub const PATH_KEY: &str = "path";

/// Source of `(section, key)` setting values.
pub trait SettingsProvider: Send + Sync {
    fn get(&self, section: &str, key: &str) -> Option<String>;
}

/// Fixed in-memory settings.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: BTreeMap<(String, String), String>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.values
            .insert((section.into(), key.into()), value.into());
        self
    }
}

impl SettingsProvider for StaticSettings {
    fn get(&self, section: &str, key: &str) -> Option<String> {
        self.values
            .get(&(section.to_string(), key.to_string()))
            .cloned()
    }
}
