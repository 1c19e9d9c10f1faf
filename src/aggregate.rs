//! Aggregation of all three configuration tiers.
//!
//! Configuration loads from three places:
//! 1. **Package** - `*.config.json` files bundled under [`PACKAGE_CONFIG_DIR`]
//! 2. **Filesystem** - the same pattern under the `[Configuration] dir` setting
//! 3. **Database** - active `prototype_config` documents in the `Configuration` collection
//!
//! Tiers are kept apart. Nothing is merged or deduplicated; consumers decide
//! precedence themselves.

use crate::document::{AggregatedConfiguration, ConfigDocument, Tier};
use crate::error::{LoadError, ScanError, SettingsError, StoreError, TierErrorKind, TierFailure};
use crate::fetcher::fetch_active;
use crate::scanner::scan_directory;
use crate::settings::{CONFIGURATION_SECTION, DIR_KEY, SettingsProvider};
use crate::store::DocumentStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration directory shipped with the package.
///
/// This is the crate's source directory at build time, baked into the
/// binary. An installed binary still points at the build machine's tree, so
/// deployments that ship `config/` elsewhere must pass that location to
/// [`PrototypeConfig::with_package_dir`].
pub const PACKAGE_CONFIG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config");

/// Loads scanning, detection and scheduling configuration for this node.
#[derive(Clone)]
pub struct PrototypeConfig {
    package_dir: PathBuf,
    settings: Arc<dyn SettingsProvider>,
    store: Arc<dyn DocumentStore>,
}

impl PrototypeConfig {
    pub fn new(settings: Arc<dyn SettingsProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            package_dir: PathBuf::from(PACKAGE_CONFIG_DIR),
            settings,
            store,
        }
    }

    /// Use a different directory for the package tier.
    pub fn with_package_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.package_dir = dir.into();
        self
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    /// Resolve the local configuration directory from settings.
    pub fn local_dir(&self) -> Result<PathBuf, SettingsError> {
        self.settings
            .get(CONFIGURATION_SECTION, DIR_KEY)
            .map(PathBuf::from)
            .ok_or_else(|| SettingsError::Missing {
                section: CONFIGURATION_SECTION.to_string(),
                key: DIR_KEY.to_string(),
            })
    }

    /// [Re]load configuration from every tier.
    ///
    /// All tiers are attempted even if one fails, so the error lists every
    /// broken tier. Any failure means no result at all.
    pub fn load(&self) -> Result<AggregatedConfiguration, LoadError> {
        let local_dir = self.local_dir()?;
        debug!(
            package = %self.package_dir.display(),
            local = %local_dir.display(),
            "Loading configuration"
        );

        let package = self.load_from_fs(&self.package_dir);
        let filesystem = self.load_from_fs(&local_dir);
        let database = self.load_from_store();

        let mut failures = Vec::new();
        let package = collect(Tier::Package, package, &mut failures);
        let filesystem = collect(Tier::Filesystem, filesystem, &mut failures);
        let database = collect(Tier::Database, database, &mut failures);

        if !failures.is_empty() {
            for failure in &failures {
                warn!(tier = %failure.tier, error = %failure.kind, "Configuration tier failed");
            }
            return Err(LoadError::Tiers(failures));
        }

        Ok(AggregatedConfiguration::new(
            package.unwrap_or_default(),
            filesystem.unwrap_or_default(),
            database.unwrap_or_default(),
        ))
    }

    /// All `*.config.json` documents under `dir`.
    pub fn load_from_fs(&self, dir: &Path) -> Result<Vec<ConfigDocument>, ScanError> {
        scan_directory(dir)
    }

    /// All active configuration documents from the store.
    pub fn load_from_store(&self) -> Result<Vec<ConfigDocument>, StoreError> {
        fetch_active(self.store.as_ref())
    }
}

fn collect<E>(
    tier: Tier,
    result: Result<Vec<ConfigDocument>, E>,
    failures: &mut Vec<TierFailure>,
) -> Option<Vec<ConfigDocument>>
where
    E: Into<TierErrorKind>,
{
    match result {
        Ok(docs) => Some(docs),
        Err(e) => {
            failures.push(TierFailure::new(tier, e));
            None
        }
    }
}

impl std::fmt::Debug for PrototypeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrototypeConfig")
            .field("package_dir", &self.package_dir)
            .finish_non_exhaustive()
    }
}
