//! Live configuration from the shared document store.

use crate::document::ConfigDocument;
use crate::error::StoreError;
use crate::store::{DocumentStore, Filter};
use tracing::trace;

/// Collection holding configuration documents.
pub const CONFIGURATION_COLLECTION: &str = "Configuration";

/// Domain tag identifying prototype configuration documents.
pub const PROTOTYPE_CONFIG_TYPE: &str = "prototype_config";

/// The fixed `{active: true, type: "prototype_config"}` filter.
pub fn active_filter() -> Filter {
    Filter::new()
        .eq("active", true)
        .eq("type", PROTOTYPE_CONFIG_TYPE)
}

/// Fetch every active prototype configuration, in query order.
///
/// Store failures are returned as errors, never as an empty list.
pub fn fetch_active(store: &dyn DocumentStore) -> Result<Vec<ConfigDocument>, StoreError> {
    trace!("Loading configurations from {}", CONFIGURATION_COLLECTION);
    let documents = store.find(CONFIGURATION_COLLECTION, &active_filter())?;
    trace!(
        count = documents.len(),
        "Total documents returned from {} [{}]",
        CONFIGURATION_COLLECTION,
        documents.len()
    );
    Ok(documents)
}
