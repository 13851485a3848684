//! Pomelo Cart - client-side cart state reconciliation.
//!
//! # Architecture
//!
//! The cart engine keeps an in-memory list of line items (one per product),
//! applies mutations optimistically, and synchronizes with two external
//! collaborators:
//!
//! - [`backend::RemoteStore`] - a document store holding the authoritative
//!   cart contents, keyed by opaque document ids
//! - [`backend::LocalCache`] - a key-value store holding a serialized
//!   snapshot of the cart for offline reads
//!
//! Both collaborators are traits, constructed once and passed explicitly
//! into [`CartStore`]. There is no ambient global client; tests substitute
//! the in-memory implementations from [`backend::memory`].
//!
//! Mutations update in-memory state first, then issue the corresponding
//! remote write. Remote failures are logged and swallowed; the in-memory
//! state is never rolled back. [`CartStore::reconcile`] is the single
//! mechanism that re-establishes ground truth from the remote store.
//!
//! # Example
//!
//! ```rust,ignore
//! use pomelo_cart::{CartConfig, CartStore};
//! use pomelo_cart::backend::memory::{InMemoryRemoteStore, MokaLocalCache};
//! use pomelo_core::{OwnerId, ProductRef};
//!
//! let store = CartStore::new(
//!     InMemoryRemoteStore::new(),
//!     MokaLocalCache::new(64),
//!     Some(OwnerId::new("user-1")),
//!     CartConfig::default(),
//! );
//!
//! store.reconcile().await;
//! store.add_item(&product).await;
//! let total = store.total();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod item;
pub mod store;

pub use config::{CartConfig, ConfigError};
pub use error::CartError;
pub use item::{CartStatus, LineItem, SyncState};
pub use store::CartStore;
