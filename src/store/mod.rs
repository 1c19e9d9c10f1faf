//! Document-store access.
//!
//! The aggregator only needs a find-with-filter over a named collection, so
//! that is the whole trait. [`SqliteStore`] is the shipped implementation.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::document::ConfigDocument;
use crate::error::StoreError;
use serde_json::Value;

/// Equality predicates on top-level document fields, all of which must hold.
///
/// Values match by JSON type as well as content: `true` does not match `1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push((field.into(), value.into()));
        self
    }

    pub fn predicates(&self) -> &[(String, Value)] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// A shared store of JSON documents grouped into collections.
pub trait DocumentStore: Send + Sync {
    /// Return every document in `collection` matching `filter`, in store order.
    ///
    /// No matches is `Ok(vec![])`; an unreachable store is an error.
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<ConfigDocument>, StoreError>;
}
