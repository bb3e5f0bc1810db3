//! Domain error types.

use common::{OrderId, ProductId};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while placing an order.
///
/// Every variant raised after the transaction opened means the transaction
/// was rolled back: no stock changed and no order was written.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request was malformed; no transaction was opened.
    #[error("Invalid order: {0}")]
    Validation(String),

    /// A line references a product that doesn't exist.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// A line asks for more units than are on hand.
    #[error("Insufficient stock for product {product_id}: only {available} left")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
    },

    /// The store failed or the transaction kept conflicting after retries.
    #[error("Storage failure: {0}")]
    Storage(StoreError),
}

impl CheckoutError {
    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckoutError::Validation(_) => "validation",
            CheckoutError::ProductNotFound(_) => "product_not_found",
            CheckoutError::InsufficientStock { .. } => "insufficient_stock",
            CheckoutError::Storage(_) => "storage",
        }
    }
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound(product_id) => CheckoutError::ProductNotFound(product_id),
            StoreError::InsufficientStock {
                product_id,
                available,
            } => CheckoutError::InsufficientStock {
                product_id,
                available,
            },
            other => CheckoutError::Storage(other),
        }
    }
}

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The product data was rejected.
    #[error("Invalid product: {0}")]
    Validation(String),

    /// No live product has this id.
    #[error("Product {0} not found")]
    NotFound(ProductId),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors that can occur while producing an invoice.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// No order has this id.
    #[error("Order {0} not found")]
    NotFound(OrderId),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The PDF writer failed.
    #[error("Failed to render invoice: {0}")]
    Render(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_stock_errors_become_checkout_errors() {
        let err = CheckoutError::from(StoreError::InsufficientStock {
            product_id: ProductId::new(3),
            available: 1,
        });
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock { available: 1, .. }
        ));

        let err = CheckoutError::from(StoreError::ProductNotFound(ProductId::new(3)));
        assert!(matches!(err, CheckoutError::ProductNotFound(_)));
    }

    #[test]
    fn other_store_errors_are_storage_failures() {
        let err = CheckoutError::from(StoreError::Conflict("deadlock".into()));
        assert_eq!(err.reason(), "storage");
    }

    #[test]
    fn insufficient_stock_message_is_user_readable() {
        let err = CheckoutError::InsufficientStock {
            product_id: ProductId::new(12),
            available: 0,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 12: only 0 left"
        );
    }
}
