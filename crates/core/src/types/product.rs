//! Product descriptor passed into cart mutations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product as presented by the catalog: the minimal set of fields a cart
/// line needs to be created from.
///
/// This is an input descriptor, not cart state. Quantity lives on the cart
/// line; `ProductRef` carries only identity and display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    /// Stable catalog identity of the product.
    pub product_id: ProductId,
    /// Display name.
    pub name: String,
    /// Price per unit in the store currency's standard unit.
    pub unit_price: Decimal,
    /// Product image URL.
    pub picture_url: String,
}

impl ProductRef {
    /// Create a new product descriptor.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Decimal,
        picture_url: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            picture_url: picture_url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_product_ref_camel_case_shape() {
        let product = ProductRef::new("p1", "Widget", dec!(19.99), "https://img.example/p1.png");
        let json = serde_json::to_value(&product).expect("serialize");
        assert_eq!(json["productId"], "p1");
        assert_eq!(json["unitPrice"], "19.99");
        assert!(json.get("quantity").is_none());
    }
}
