//! Tiered configuration aggregation for automation nodes.
//!
//! Collects configuration documents from the package, the local filesystem
//! and a shared document store, tagged by the tier they came from.

pub mod aggregate;
pub mod cli;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod logging;
pub mod scanner;
pub mod settings;
pub mod store;

pub use aggregate::PrototypeConfig;
pub use document::{AggregatedConfiguration, ConfigDocument, Tier};
pub use error::{LoadError, ScanError, SettingsError, StoreError, TierFailure};
