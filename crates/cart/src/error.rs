//! Operation-surface errors.
//!
//! Almost nothing in the cart engine fails loudly. Mutation-path remote
//! failures are logged and absorbed, with `reconcile()` as the designated
//! correction mechanism. `CartError` exists for the few operations that
//! must surface a failure to the caller, order placement chiefly.

use thiserror::Error;

use crate::backend::StoreError;

/// Errors returned by cart operations that are allowed to fail.
#[derive(Debug, Error)]
pub enum CartError {
    /// A collaborator store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The operation requires at least one line in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// The operation requires an authenticated owner; local-only carts
    /// cannot place orders.
    #[error("no authenticated owner")]
    NotAuthenticated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        assert_eq!(CartError::EmptyCart.to_string(), "cart is empty");
        assert_eq!(
            CartError::NotAuthenticated.to_string(),
            "no authenticated owner"
        );

        let err = CartError::from(StoreError::Unavailable("timeout".to_string()));
        assert_eq!(err.to_string(), "store error: store unavailable: timeout");
    }
}
