//! Integration tests for Pomelo.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pomelo-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_session` - Single-client session flows (browse, mutate, order)
//! - `multi_device` - Two stores sharing one remote, converging via reconcile
//!
//! Scenarios run against the in-memory collaborators; no backend needs to
//! be started.

use pomelo_cart::backend::memory::{InMemoryRemoteStore, MokaLocalCache};
use pomelo_cart::{CartConfig, CartStore};
use pomelo_core::OwnerId;

/// A cart store plus handles to the collaborators behind it, so a scenario
/// can seed documents, simulate outages, and inspect what was written.
pub struct TestContext {
    pub remote: InMemoryRemoteStore,
    pub cache: MokaLocalCache,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        init_tracing();
        Self {
            remote: InMemoryRemoteStore::new(),
            cache: MokaLocalCache::new(64),
        }
    }

    /// Build a cart store for an owner, sharing this context's remote
    /// store and cache. Call twice with the same owner to simulate two
    /// devices or two sessions.
    #[must_use]
    pub fn cart_for(&self, owner: &str) -> CartStore<InMemoryRemoteStore, MokaLocalCache> {
        CartStore::new(
            self.remote.clone(),
            self.cache.clone(),
            Some(OwnerId::new(owner)),
            CartConfig::default(),
        )
    }

    /// Build an ownerless, local-only cart store.
    #[must_use]
    pub fn anonymous_cart(&self) -> CartStore<InMemoryRemoteStore, MokaLocalCache> {
        CartStore::new(
            self.remote.clone(),
            self.cache.clone(),
            None,
            CartConfig::default(),
        )
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a test subscriber honoring `RUST_LOG`. Safe to call from every
/// test; only the first call wins.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
