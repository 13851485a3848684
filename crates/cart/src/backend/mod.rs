//! Collaborator contracts for the cart engine.
//!
//! The cart engine owns no wire format and no persistence of its own. It
//! talks to two external collaborators:
//!
//! - [`RemoteStore`] - a document store with generated ids, equality-filter
//!   queries, field patches, and delete-by-id (the shape of a managed
//!   cloud document database)
//! - [`LocalCache`] - a string key-value store used as an offline mirror
//!
//! Documents are JSON values; the engine serializes its own document
//! shapes through `serde_json` and consumes whatever the collaborators
//! return.

pub mod memory;

use serde_json::Value;
use thiserror::Error;

use pomelo_core::DocId;

/// Errors surfaced by the collaborator stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or backend failure; the store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The target document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// A document could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// An equality filter over document fields.
///
/// The only query shape the cart engine needs: every clause must match the
/// corresponding top-level field of the document exactly.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Create an empty filter that matches every document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality clause on a top-level document field.
    #[must_use]
    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    /// Check whether a document satisfies every clause.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

/// A document store keyed by opaque, store-assigned document ids.
pub trait RemoteStore: Send + Sync {
    /// Create a document and return its generated id.
    fn create(
        &self,
        collection: &str,
        doc: Value,
    ) -> impl Future<Output = Result<DocId, StoreError>> + Send;

    /// Read a document by id. Returns `None` if it does not exist.
    fn get(
        &self,
        collection: &str,
        id: &DocId,
    ) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// List all documents in a collection matching an equality filter.
    fn list(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<(DocId, Value)>, StoreError>> + Send;

    /// Merge the given top-level fields into an existing document.
    fn patch(
        &self,
        collection: &str,
        id: &DocId,
        fields: Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete a document by id.
    fn delete(
        &self,
        collection: &str,
        id: &DocId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// A key-value store holding serialized snapshots for offline reads.
pub trait LocalCache: Send + Sync {
    /// Read the value stored under a key, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Store a value under a key, replacing any previous value.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove a key. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove every key in the store.
    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
