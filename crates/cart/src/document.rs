//! Remote document shapes.
//!
//! The remote store holds cart lines as individual documents in the cart
//! collection, and placed orders as single documents in the order
//! collection. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;

use pomelo_core::{OwnerId, ProductId};

use crate::item::{LineItem, LineSnapshot};

/// One cart line as stored remotely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDocument {
    pub owner_id: OwnerId,
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub picture_url: String,
    pub quantity: u32,
    // Older clients wrote cart documents without timestamps; default them
    // on read so those documents still parse.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl CartDocument {
    /// Build the remote document for a line item owned by `owner`.
    #[must_use]
    pub fn from_line(owner: &OwnerId, line: &LineItem, now: DateTime<Utc>) -> Self {
        Self {
            owner_id: owner.clone(),
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            unit_price: line.unit_price,
            picture_url: line.picture_url.clone(),
            quantity: line.quantity,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Order status written on placement. Fulfillment transitions happen
/// elsewhere; the cart engine only ever writes the initial state.
pub const ORDER_STATUS_PENDING: &str = "pending";

/// A placed order as stored remotely: a snapshot of the cart at the moment
/// of placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocument {
    pub owner_id: OwnerId,
    pub order_items: Vec<LineSnapshot>,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl OrderDocument {
    /// Build an order document from the current cart lines.
    #[must_use]
    pub fn from_lines(owner: &OwnerId, lines: &[LineItem], now: DateTime<Utc>) -> Self {
        Self {
            owner_id: owner.clone(),
            order_items: lines.iter().map(LineSnapshot::from).collect(),
            status: ORDER_STATUS_PENDING.to_string(),
            timestamp: now,
        }
    }
}
