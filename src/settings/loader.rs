//! Layered settings loading.

use super::merge::deep_merge_all;
use super::{CONFIGURATION_SECTION, DATABASE_SECTION, DIR_KEY, PATH_KEY, SettingsProvider};
use crate::error::SettingsError;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the settings file inside the node home directory.
pub const SETTINGS_FILE: &str = "settings.yaml";

/// Where settings are read from.
#[derive(Debug, Clone)]
pub struct SettingsPaths {
    /// Node home directory; defaults are derived from it
    pub home: PathBuf,
    /// Explicit settings file that replaces `<home>/settings.yaml`
    pub settings_file: Option<PathBuf>,
}

impl SettingsPaths {
    /// Discover paths from the environment.
    pub fn discover() -> Self {
        // Home: PROTOTYPE_HOME or ~/.prototype
        let home = std::env::var("PROTOTYPE_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".prototype")))
            .unwrap_or_else(|| PathBuf::from(".prototype"));

        let settings_file = std::env::var("PROTOTYPE_SETTINGS_PATH")
            .ok()
            .map(PathBuf::from);

        Self {
            home,
            settings_file,
        }
    }

    /// Paths rooted at an explicit home directory.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            settings_file: None,
        }
    }

    /// The settings file to read and whether it must exist.
    fn effective_file(&self) -> (PathBuf, bool) {
        match &self.settings_file {
            Some(path) => (path.clone(), true),
            None => (self.home.join(SETTINGS_FILE), false),
        }
    }
}

/// Resolved loader settings, addressable by `(section, key)`.
#[derive(Debug, Clone)]
pub struct Settings {
    values: Value,
    source_path: Option<PathBuf>,
}

impl Settings {
    /// Load from discovered paths and apply environment overrides.
    pub fn load() -> Result<Self, SettingsError> {
        let mut settings = Self::load_with_paths(&SettingsPaths::discover())?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Load defaults and the settings file, without environment overrides.
    pub fn load_with_paths(paths: &SettingsPaths) -> Result<Self, SettingsError> {
        let mut layers = vec![Self::defaults(&paths.home)];

        let (file, required) = paths.effective_file();
        let mut source_path = None;
        if required || file.exists() {
            layers.push(read_settings_file(&file)?);
            source_path = Some(file);
        } else {
            debug!(path = %file.display(), "No settings file, using defaults");
        }

        Ok(Self {
            values: deep_merge_all(layers),
            source_path,
        })
    }

    fn defaults(home: &Path) -> Value {
        json!({
            CONFIGURATION_SECTION: { DIR_KEY: home.join("etc").to_string_lossy() },
            DATABASE_SECTION: { PATH_KEY: home.join("prototype.db").to_string_lossy() },
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("PROTOTYPE_CONFIG_DIR") {
            self.set(CONFIGURATION_SECTION, DIR_KEY, dir);
        }
        if let Ok(path) = std::env::var("PROTOTYPE_DB_PATH") {
            self.set(DATABASE_SECTION, PATH_KEY, path);
        }
    }

    /// Override a single value.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        if !self.values.is_object() {
            self.values = json!({});
        }
        let section_value = self.values[section].take();
        let mut section_map = match section_value {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        section_map.insert(key.to_string(), Value::String(value.into()));
        self.values[section] = Value::Object(section_map);
    }

    /// The settings file that was read, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Local configuration directory.
    pub fn config_dir(&self) -> Option<PathBuf> {
        self.get(CONFIGURATION_SECTION, DIR_KEY).map(PathBuf::from)
    }

    /// Document store path.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.get(DATABASE_SECTION, PATH_KEY).map(PathBuf::from)
    }
}

impl SettingsProvider for Settings {
    fn get(&self, section: &str, key: &str) -> Option<String> {
        match self.values.get(section)?.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }
}

fn read_settings_file(path: &Path) -> Result<Value, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // An empty file parses as null, which merges as "no overrides"
    serde_yaml::from_str(&content).map_err(|source| SettingsError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
