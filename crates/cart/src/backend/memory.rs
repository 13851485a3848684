//! In-memory collaborator implementations.
//!
//! [`InMemoryRemoteStore`] stands in for the managed document database in
//! tests and local development. It assigns uuid document ids, supports the
//! same equality-filter queries, and can be flipped into an unavailable
//! state to exercise the offline paths.
//!
//! [`MokaLocalCache`] backs the [`LocalCache`] contract with a
//! `moka::future::Cache`, matching how snapshots are cached in production.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use moka::future::Cache;
use serde_json::Value;
use uuid::Uuid;

use pomelo_core::DocId;

use super::{Filter, LocalCache, RemoteStore, StoreError};

// =============================================================================
// InMemoryRemoteStore
// =============================================================================

/// An in-memory document store with generated ids.
///
/// Cloning is cheap and clones share state, so a test can keep a handle to
/// inspect or seed documents while the cart engine owns another.
#[derive(Clone, Default)]
pub struct InMemoryRemoteStore {
    inner: Arc<RemoteInner>,
}

#[derive(Default)]
struct RemoteInner {
    // Vec per collection keeps insertion order, which makes list() results
    // deterministic in tests.
    collections: Mutex<HashMap<String, Vec<(DocId, Value)>>>,
    unavailable: AtomicBool,
}

impl InMemoryRemoteStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the simulated outage. While unavailable, every operation
    /// returns [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Insert a document with a chosen id, bypassing id generation.
    ///
    /// Test seeding hook: lets a scenario plant documents (including
    /// duplicates for the same product) exactly as a buggy older client
    /// would have written them.
    pub fn seed(&self, collection: &str, id: impl Into<DocId>, doc: Value) {
        let mut collections = lock(&self.inner.collections);
        collections
            .entry(collection.to_string())
            .or_default()
            .push((id.into(), doc));
    }

    /// Number of documents currently in a collection.
    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        let collections = lock(&self.inner.collections);
        collections.get(collection).map_or(0, Vec::len)
    }

    /// Snapshot of every document in a collection, in insertion order.
    #[must_use]
    pub fn dump(&self, collection: &str) -> Vec<(DocId, Value)> {
        let collections = lock(&self.inner.collections);
        collections.get(collection).cloned().unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RemoteStore for InMemoryRemoteStore {
    async fn create(&self, collection: &str, doc: Value) -> Result<DocId, StoreError> {
        self.check_available()?;
        let id = DocId::new(Uuid::new_v4().to_string());
        let mut collections = lock(&self.inner.collections);
        collections
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), doc));
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &DocId) -> Result<Option<Value>, StoreError> {
        self.check_available()?;
        let collections = lock(&self.inner.collections);
        Ok(collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|(doc_id, _)| doc_id == id)
                .map(|(_, doc)| doc.clone())
        }))
    }

    async fn list(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<(DocId, Value)>, StoreError> {
        self.check_available()?;
        let collections = lock(&self.inner.collections);
        Ok(collections.get(collection).map_or_else(Vec::new, |docs| {
            docs.iter()
                .filter(|(_, doc)| filter.matches(doc))
                .cloned()
                .collect()
        }))
    }

    async fn patch(&self, collection: &str, id: &DocId, fields: Value) -> Result<(), StoreError> {
        self.check_available()?;
        let mut collections = lock(&self.inner.collections);
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(doc_id, _)| doc_id == id))
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;

        if let (Value::Object(target), Value::Object(updates)) = (&mut doc.1, fields) {
            for (key, value) in updates {
                target.insert(key, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocId) -> Result<(), StoreError> {
        self.check_available()?;
        let mut collections = lock(&self.inner.collections);
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;

        let before = docs.len();
        docs.retain(|(doc_id, _)| doc_id != id);
        if docs.len() == before {
            return Err(StoreError::NotFound(format!("{collection}/{id}")));
        }
        Ok(())
    }
}

// =============================================================================
// MokaLocalCache
// =============================================================================

/// A [`LocalCache`] backed by `moka::future::Cache`.
#[derive(Clone)]
pub struct MokaLocalCache {
    cache: Cache<String, String>,
}

impl MokaLocalCache {
    /// Create a cache holding up to `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
        }
    }
}

impl LocalCache for MokaLocalCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.cache.invalidate_all();
        Ok(())
    }
}
