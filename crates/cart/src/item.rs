//! Cart line items and their synchronization state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pomelo_core::{DocId, ProductId, ProductRef};

/// Synchronization state of a line item relative to the remote store.
///
/// Transitions:
/// - `Absent -> PendingAdd -> Synced` (create completes, doc id attached)
/// - `Synced -> PendingUpdate -> Synced` (quantity patch completes)
/// - `Synced -> Absent` (line removed locally, delete issued)
///
/// A pending state that never confirms is not rolled back; the next
/// [`reconcile`](crate::CartStore::reconcile) replaces it with whatever the
/// remote store actually holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Inserted locally; the remote create has not confirmed yet.
    PendingAdd,
    /// Quantity changed locally; the remote patch has not confirmed yet.
    PendingUpdate,
    /// In-memory state matches the last confirmed remote write.
    Synced,
}

/// Freshness of the cart as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CartStatus {
    /// The last reconcile against the remote store succeeded.
    #[default]
    Fresh,
    /// The remote store was unreachable; contents come from the local
    /// cache snapshot and may be stale.
    Offline,
}

/// A single line in the cart: one product, one quantity.
///
/// Invariants, maintained by [`CartStore`](crate::CartStore):
/// - exactly one line per distinct `product_id`
/// - `quantity >= 1`; a decrement to zero removes the line
/// - `remote_doc_id`, once attached, never changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    /// Stable catalog identity of the product.
    pub product_id: ProductId,
    /// Remote document id, once the create has confirmed. `None` for lines
    /// added locally that have not synced yet.
    pub remote_doc_id: Option<DocId>,
    /// Display name.
    pub name: String,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Product image URL.
    pub picture_url: String,
    /// Units of this product in the cart. Always at least 1.
    pub quantity: u32,
    /// Synchronization state relative to the remote store.
    pub sync: SyncState,
}

impl LineItem {
    /// Create a fresh, not-yet-synced line for one unit of a product.
    #[must_use]
    pub fn from_product(product: &ProductRef) -> Self {
        Self {
            product_id: product.product_id.clone(),
            remote_doc_id: None,
            name: product.name.clone(),
            unit_price: product.unit_price,
            picture_url: product.picture_url.clone(),
            quantity: 1,
            sync: SyncState::PendingAdd,
        }
    }

    /// Price of this line: `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Serializable snapshot of a line item.
///
/// Used both as the local cache mirror format and as the item shape
/// embedded in order documents. Carries the remote doc id so a cache
/// restore can keep addressing documents it already knows about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSnapshot {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_doc_id: Option<DocId>,
    pub name: String,
    pub unit_price: Decimal,
    pub picture_url: String,
    pub quantity: u32,
}

impl From<&LineItem> for LineSnapshot {
    fn from(line: &LineItem) -> Self {
        Self {
            product_id: line.product_id.clone(),
            remote_doc_id: line.remote_doc_id.clone(),
            name: line.name.clone(),
            unit_price: line.unit_price,
            picture_url: line.picture_url.clone(),
            quantity: line.quantity,
        }
    }
}

impl From<LineSnapshot> for LineItem {
    fn from(snapshot: LineSnapshot) -> Self {
        let sync = if snapshot.remote_doc_id.is_some() {
            SyncState::Synced
        } else {
            SyncState::PendingAdd
        };
        Self {
            product_id: snapshot.product_id,
            remote_doc_id: snapshot.remote_doc_id,
            name: snapshot.name,
            unit_price: snapshot.unit_price,
            picture_url: snapshot.picture_url,
            quantity: snapshot.quantity.max(1),
            sync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn widget() -> ProductRef {
        ProductRef::new("p1", "Widget", dec!(19.99), "https://img.example/p1.png")
    }

    #[test]
    fn test_from_product_starts_pending_with_quantity_one() {
        let line = LineItem::from_product(&widget());
        assert_eq!(line.quantity, 1);
        assert_eq!(line.sync, SyncState::PendingAdd);
        assert!(line.remote_doc_id.is_none());
    }

    #[test]
    fn test_line_total_scales_with_quantity() {
        let mut line = LineItem::from_product(&widget());
        line.quantity = 3;
        assert_eq!(line.line_total(), dec!(59.97));
    }

    #[test]
    fn test_snapshot_round_trip_keeps_doc_id() {
        let mut line = LineItem::from_product(&widget());
        line.remote_doc_id = Some(DocId::new("d1"));
        line.sync = SyncState::Synced;
        line.quantity = 2;

        let json = serde_json::to_string(&LineSnapshot::from(&line)).expect("serialize");
        let snapshot: LineSnapshot = serde_json::from_str(&json).expect("deserialize");
        let restored = LineItem::from(snapshot);

        assert_eq!(restored, line);
    }

    #[test]
    fn test_snapshot_without_doc_id_restores_as_pending() {
        let line = LineItem::from_product(&widget());
        let restored = LineItem::from(LineSnapshot::from(&line));
        assert_eq!(restored.sync, SyncState::PendingAdd);
    }
}
