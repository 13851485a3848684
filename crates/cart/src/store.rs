//! The cart store: optimistic in-memory state, remote write-behind,
//! local cache write-through.
//!
//! Every mutation applies to in-memory state first, under the state lock,
//! then mirrors the full item list to the local cache, then issues the
//! corresponding remote write. The in-memory merge-by-product-id rule is
//! the sole concurrency mechanism: two rapid adds for the same product
//! serialize through the lock and can never produce two lines, no matter
//! how their remote writes interleave.
//!
//! Remote writes are not transactional and are never rolled back. A write
//! that fails (or lands out of order) leaves the remote store drifted;
//! [`CartStore::reconcile`] re-reads the authoritative remote state and
//! replaces in-memory state wholesale, which is the single designated
//! correction mechanism.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use pomelo_core::{DocId, OrderId, OwnerId, ProductId, ProductRef};

use crate::backend::{Filter, LocalCache, RemoteStore, StoreError};
use crate::config::CartConfig;
use crate::document::{CartDocument, OrderDocument};
use crate::error::CartError;
use crate::item::{CartStatus, LineItem, LineSnapshot, SyncState};

/// Client-side cart with remote reconciliation.
///
/// Holds the in-memory line items for one owner (or an ownerless,
/// local-only cart), a [`RemoteStore`] collaborator for the authoritative
/// contents, and a [`LocalCache`] collaborator for offline snapshots.
pub struct CartStore<R, L> {
    remote: R,
    cache: L,
    owner: Option<OwnerId>,
    config: CartConfig,
    state: Mutex<CartState>,
}

#[derive(Default)]
struct CartState {
    items: Vec<LineItem>,
    status: CartStatus,
}

/// Remote follow-up decided while the state lock is held.
enum Follow {
    Create,
    Patch { doc_id: Option<DocId>, quantity: u32 },
}

impl<R: RemoteStore, L: LocalCache> CartStore<R, L> {
    /// Create an empty cart.
    ///
    /// A cart without an owner is local-only: it mirrors to the cache but
    /// never touches the remote store.
    pub fn new(remote: R, cache: L, owner: Option<OwnerId>, config: CartConfig) -> Self {
        Self {
            remote,
            cache,
            owner,
            config,
            state: Mutex::new(CartState::default()),
        }
    }

    /// The authenticated owner this cart is scoped to, if any.
    #[must_use]
    pub fn owner(&self) -> Option<&OwnerId> {
        self.owner.as_ref()
    }

    // =========================================================================
    // Pure reads
    // =========================================================================

    /// Snapshot of the current line items, in display order.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.lock().items.clone()
    }

    /// Sum of `unit_price * quantity` over all lines. No I/O.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lock().items.iter().map(LineItem::line_total).sum()
    }

    /// Total number of units across all lines (the cart badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lock().items.iter().map(|line| line.quantity).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Freshness of the current contents.
    #[must_use]
    pub fn status(&self) -> CartStatus {
        self.lock().status
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product.
    ///
    /// If a line for the product already exists its quantity is
    /// incremented; otherwise a new line is inserted with quantity 1 and a
    /// remote create is issued, attaching the returned document id on
    /// completion. Remote failures are logged, never surfaced.
    #[instrument(skip_all, fields(product_id = %product.product_id))]
    pub async fn add_item(&self, product: &ProductRef) {
        let (follow, snapshot) = {
            let mut state = self.lock();
            let follow = match state
                .items
                .iter_mut()
                .find(|line| line.product_id == product.product_id)
            {
                Some(line) => {
                    line.quantity += 1;
                    if line.sync == SyncState::Synced {
                        line.sync = SyncState::PendingUpdate;
                    }
                    Follow::Patch {
                        doc_id: line.remote_doc_id.clone(),
                        quantity: line.quantity,
                    }
                }
                None => {
                    state.items.push(LineItem::from_product(product));
                    Follow::Create
                }
            };
            (follow, snapshot_of(&state))
        };

        self.mirror_cache(&snapshot).await;

        let Some(owner) = self.owner.clone() else {
            return;
        };
        match follow {
            Follow::Create => self.push_create(&owner, product).await,
            Follow::Patch { doc_id, quantity } => {
                self.push_quantity(&owner, &product.product_id, doc_id, quantity)
                    .await;
            }
        }
    }

    /// Set the quantity of a line directly. A quantity of 0 removes the
    /// line, same as [`remove_item`](Self::remove_item).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn set_quantity(&self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product_id).await;
            return;
        }

        let (doc_id, snapshot) = {
            let mut state = self.lock();
            let Some(line) = state
                .items
                .iter_mut()
                .find(|line| &line.product_id == product_id)
            else {
                debug!("set_quantity on absent line; ignoring");
                return;
            };
            line.quantity = quantity;
            if line.sync == SyncState::Synced {
                line.sync = SyncState::PendingUpdate;
            }
            (line.remote_doc_id.clone(), snapshot_of(&state))
        };

        self.mirror_cache(&snapshot).await;

        if let Some(owner) = self.owner.clone() {
            self.push_quantity(&owner, product_id, doc_id, quantity).await;
        }
    }

    /// Apply a signed quantity delta (the `+` / `-` cart buttons).
    /// Dropping to zero or below removes the line.
    pub async fn adjust_quantity(&self, product_id: &ProductId, delta: i64) {
        let current = {
            let state = self.lock();
            state
                .items
                .iter()
                .find(|line| &line.product_id == product_id)
                .map(|line| i64::from(line.quantity))
        };
        let Some(current) = current else {
            debug!(product_id = %product_id, "adjust_quantity on absent line; ignoring");
            return;
        };

        let next = current + delta;
        if next <= 0 {
            self.remove_item(product_id).await;
        } else {
            self.set_quantity(product_id, u32::try_from(next).unwrap_or(u32::MAX))
                .await;
        }
    }

    /// Remove a line entirely.
    ///
    /// The line is dropped from in-memory state immediately. The remote
    /// delete prefers the cached document id; without one, every remote
    /// document matching `(ownerId, productId)` is deleted, a defensive
    /// sweep against duplicate-write bugs from concurrent adds. A failed
    /// remote delete does not resurrect the line. Calling this for an
    /// absent product is a no-op (the sweep still runs).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: &ProductId) {
        let (removed, snapshot) = {
            let mut state = self.lock();
            let removed = state
                .items
                .iter()
                .position(|line| &line.product_id == product_id)
                .map(|index| state.items.remove(index));
            (removed, snapshot_of(&state))
        };

        let was_present = removed.is_some();
        if was_present {
            self.mirror_cache(&snapshot).await;
        }

        let Some(owner) = self.owner.clone() else {
            return;
        };
        match removed.and_then(|line| line.remote_doc_id) {
            Some(doc_id) => match self
                .remote
                .delete(&self.config.cart_collection, &doc_id)
                .await
            {
                Ok(()) => debug!(%doc_id, "remote cart document deleted"),
                Err(StoreError::NotFound(_)) => {
                    debug!(%doc_id, "remote cart document already gone");
                }
                Err(e) => warn!(
                    %doc_id,
                    error = %e,
                    "remote delete failed; line stays removed locally, reconcile corrects the remote"
                ),
            },
            None => self.sweep_remote(&owner, product_id).await,
        }
    }

    /// Refresh from the remote store.
    ///
    /// Fetches all cart documents for the owner, collapses duplicate
    /// product ids by summing quantities (invariant repair for historical
    /// duplicate writes), replaces in-memory state wholesale, and mirrors
    /// the result to the cache. If the remote fetch fails, the last cache
    /// snapshot is served instead and the cart is marked
    /// [`CartStatus::Offline`].
    ///
    /// Ownerless carts load from the cache only.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) {
        let Some(owner) = self.owner.clone() else {
            let items = self.load_cache_snapshot().await;
            let mut state = self.lock();
            state.items = items;
            state.status = CartStatus::Fresh;
            return;
        };

        let filter = Filter::new().field_eq("ownerId", owner.as_str());
        match self.remote.list(&self.config.cart_collection, &filter).await {
            Ok(docs) => {
                debug!(count = docs.len(), "loaded remote cart documents");
                let merged = merge_documents(docs);
                let snapshot = {
                    let mut state = self.lock();
                    state.items = merged;
                    state.status = CartStatus::Fresh;
                    snapshot_of(&state)
                };
                self.mirror_cache(&snapshot).await;
            }
            Err(e) => {
                warn!(error = %e, "remote fetch failed; serving cached snapshot");
                let items = self.load_cache_snapshot().await;
                let mut state = self.lock();
                state.items = items;
                state.status = CartStatus::Offline;
            }
        }
    }

    /// Empty the cart everywhere: in-memory state, the cache mirror, and
    /// every remote cart document for the owner.
    ///
    /// Remote deletes are best-effort; individual failures are logged and
    /// do not abort the batch.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        let known: Vec<DocId> = {
            let mut state = self.lock();
            let items = std::mem::take(&mut state.items);
            items
                .into_iter()
                .filter_map(|line| line.remote_doc_id)
                .collect()
        };

        if let Err(e) = self.cache.delete(&self.cache_key()).await {
            warn!(error = %e, "failed to drop cache mirror");
        }

        let Some(owner) = self.owner.clone() else {
            return;
        };

        // Delete from a fresh query so stray documents are caught too;
        // fall back to the ids we knew if the query fails.
        let filter = Filter::new().field_eq("ownerId", owner.as_str());
        let targets = match self.remote.list(&self.config.cart_collection, &filter).await {
            Ok(docs) => docs.into_iter().map(|(doc_id, _)| doc_id).collect(),
            Err(e) => {
                warn!(error = %e, "could not list cart documents; deleting known ids only");
                known
            }
        };

        for doc_id in targets {
            match self
                .remote
                .delete(&self.config.cart_collection, &doc_id)
                .await
            {
                Ok(()) | Err(StoreError::NotFound(_)) => {}
                Err(e) => warn!(%doc_id, error = %e, "failed to delete cart document"),
            }
        }
    }

    /// Drop local state and the cache mirror without touching the remote
    /// store. This is the logout path: the owner's remote cart survives
    /// for their next session.
    pub async fn forget_local(&self) {
        {
            let mut state = self.lock();
            state.items.clear();
            state.status = CartStatus::Fresh;
        }
        if let Err(e) = self.cache.delete(&self.cache_key()).await {
            warn!(error = %e, "failed to drop cache mirror");
        }
    }

    /// Place an order: write an order document snapshotting the current
    /// lines, then drop local state and the cache mirror.
    ///
    /// Remote cart documents are left in place as order history; a bare
    /// [`clear`](Self::clear) is the destructive variant.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotAuthenticated`] for ownerless carts,
    /// [`CartError::EmptyCart`] if there is nothing to order, and
    /// [`CartError::Store`] if the order document cannot be written. On
    /// error the cart is left untouched.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<OrderId, CartError> {
        let owner = self.owner.clone().ok_or(CartError::NotAuthenticated)?;
        let lines = {
            let state = self.lock();
            if state.items.is_empty() {
                return Err(CartError::EmptyCart);
            }
            state.items.clone()
        };

        let order = OrderDocument::from_lines(&owner, &lines, Utc::now());
        let doc = serde_json::to_value(&order).map_err(StoreError::from)?;
        let doc_id = self
            .remote
            .create(&self.config.order_collection, doc)
            .await?;
        debug!(order_id = %doc_id, lines = lines.len(), "order placed");

        self.forget_local().await;
        Ok(OrderId::new(doc_id.into_inner()))
    }

    // =========================================================================
    // Remote write-behind
    // =========================================================================

    /// Issue the remote create for a freshly inserted line and attach the
    /// returned document id.
    async fn push_create(&self, owner: &OwnerId, product: &ProductRef) {
        // Re-read the quantity at send time: a rapid second add may have
        // bumped it past 1 before this create got on the wire.
        let quantity = {
            let state = self.lock();
            state
                .items
                .iter()
                .find(|line| line.product_id == product.product_id)
                .map(|line| line.quantity)
        };
        let Some(quantity) = quantity else {
            debug!("line removed before create was sent; skipping");
            return;
        };

        let mut line = LineItem::from_product(product);
        line.quantity = quantity;
        let doc = CartDocument::from_line(owner, &line, Utc::now());
        let doc = match serde_json::to_value(&doc) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "could not serialize cart document");
                return;
            }
        };

        match self.remote.create(&self.config.cart_collection, doc).await {
            Ok(doc_id) => {
                let mut state = self.lock();
                match state
                    .items
                    .iter_mut()
                    .find(|line| line.product_id == product.product_id)
                {
                    Some(line) if line.remote_doc_id.is_none() => {
                        line.remote_doc_id = Some(doc_id);
                        if line.sync == SyncState::PendingAdd {
                            line.sync = SyncState::Synced;
                        }
                    }
                    Some(_) => {}
                    None => debug!(
                        %doc_id,
                        "line removed while create was in flight; stray document remains until removed or cleared"
                    ),
                }
            }
            Err(e) => warn!(error = %e, "remote create failed; will be corrected by reconcile"),
        }
    }

    /// Patch the remote quantity for a line, resolving the target document
    /// by cached id or, failing that, by an `(ownerId, productId)` query.
    async fn push_quantity(
        &self,
        owner: &OwnerId,
        product_id: &ProductId,
        doc_id: Option<DocId>,
        quantity: u32,
    ) {
        let targets: Vec<DocId> = match doc_id {
            Some(doc_id) => vec![doc_id],
            None => {
                let filter = Filter::new()
                    .field_eq("ownerId", owner.as_str())
                    .field_eq("productId", product_id.as_str());
                match self.remote.list(&self.config.cart_collection, &filter).await {
                    Ok(docs) if docs.is_empty() => {
                        debug!("no remote documents to patch; create may still be in flight");
                        return;
                    }
                    Ok(docs) => docs.into_iter().map(|(doc_id, _)| doc_id).collect(),
                    Err(e) => {
                        warn!(error = %e, "could not resolve document for quantity patch");
                        return;
                    }
                }
            }
        };

        let fields = json!({ "quantity": quantity, "updatedAt": Utc::now() });
        let mut patched = false;
        for doc_id in targets {
            match self
                .remote
                .patch(&self.config.cart_collection, &doc_id, fields.clone())
                .await
            {
                Ok(()) => patched = true,
                Err(StoreError::NotFound(_)) => {
                    debug!(%doc_id, "patch target vanished; treating as satisfied");
                }
                Err(e) => warn!(
                    %doc_id,
                    error = %e,
                    "remote quantity patch failed; will be corrected by reconcile"
                ),
            }
        }

        if patched {
            let mut state = self.lock();
            if let Some(line) = state
                .items
                .iter_mut()
                .find(|line| &line.product_id == product_id)
                && line.sync == SyncState::PendingUpdate
                && line.quantity == quantity
            {
                line.sync = SyncState::Synced;
            }
        }
    }

    /// Delete every remote document matching `(ownerId, productId)`.
    /// Defensive cleanup for lines without a cached document id.
    async fn sweep_remote(&self, owner: &OwnerId, product_id: &ProductId) {
        let filter = Filter::new()
            .field_eq("ownerId", owner.as_str())
            .field_eq("productId", product_id.as_str());
        match self.remote.list(&self.config.cart_collection, &filter).await {
            Ok(docs) => {
                for (doc_id, _) in docs {
                    match self
                        .remote
                        .delete(&self.config.cart_collection, &doc_id)
                        .await
                    {
                        Ok(()) | Err(StoreError::NotFound(_)) => {}
                        Err(e) => {
                            warn!(%doc_id, error = %e, "failed to delete matching cart document");
                        }
                    }
                }
            }
            Err(e) => warn!(error = %e, "could not query cart documents for defensive delete"),
        }
    }

    // =========================================================================
    // Cache mirror
    // =========================================================================

    fn cache_key(&self) -> String {
        let scope = self.owner.as_ref().map_or("local", OwnerId::as_str);
        format!("{}:{scope}", self.config.cache_prefix)
    }

    async fn mirror_cache(&self, snapshot: &[LineSnapshot]) {
        match serde_json::to_string(snapshot) {
            Ok(json) => {
                if let Err(e) = self.cache.set(&self.cache_key(), json).await {
                    warn!(error = %e, "cache mirror write failed");
                }
            }
            Err(e) => warn!(error = %e, "could not serialize cart snapshot"),
        }
    }

    async fn load_cache_snapshot(&self) -> Vec<LineItem> {
        match self.cache.get(&self.cache_key()).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<LineSnapshot>>(&json) {
                Ok(snapshots) => snapshots.into_iter().map(LineItem::from).collect(),
                Err(e) => {
                    warn!(error = %e, "corrupt cache snapshot; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "cache read failed; starting empty");
                Vec::new()
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn snapshot_of(state: &CartState) -> Vec<LineSnapshot> {
    state.items.iter().map(LineSnapshot::from).collect()
}

/// Fold remote documents into line items, collapsing duplicate product ids.
///
/// Historical duplicate-write bugs produced multiple documents for one
/// product; they are merged by summing quantities, keeping the first-seen
/// document id. Malformed documents are skipped, not fatal.
fn merge_documents(docs: Vec<(DocId, Value)>) -> Vec<LineItem> {
    let mut merged: Vec<LineItem> = Vec::new();
    for (doc_id, value) in docs {
        let doc: CartDocument = match serde_json::from_value(value) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(%doc_id, error = %e, "skipping malformed cart document");
                continue;
            }
        };

        if let Some(line) = merged
            .iter_mut()
            .find(|line| line.product_id == doc.product_id)
        {
            debug!(product_id = %doc.product_id, "collapsing duplicate cart document");
            line.quantity += doc.quantity.max(1);
        } else {
            merged.push(LineItem {
                product_id: doc.product_id,
                remote_doc_id: Some(doc_id),
                name: doc.name,
                unit_price: doc.unit_price,
                picture_url: doc.picture_url,
                quantity: doc.quantity.max(1),
                sync: SyncState::Synced,
            });
        }
    }
    merged
}
