//! Checkout client error types.

use common::{OrderId, ProductId};
use thiserror::Error;

/// Errors raised by a [`crate::Storefront`] backend.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// The server refused the request (validation, unknown product,
    /// insufficient stock).
    #[error("{0}")]
    Rejected(String),

    /// The server failed to handle the request.
    #[error("Server error: {0}")]
    Server(String),

    /// The requested invoice doesn't exist.
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    /// The request never produced a usable response.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors surfaced to the point-of-sale operator.
#[derive(Debug, Error)]
pub enum CartError {
    /// Adding another unit would exceed the last known stock.
    #[error("No more stock available for {name}")]
    OutOfStock { product_id: ProductId, name: String },

    /// The product isn't in the loaded catalog.
    #[error("Product {0} is not in the catalog")]
    UnknownProduct(ProductId),

    #[error("Cart is empty")]
    EmptyCart,

    /// The operator declined the confirmation prompt.
    #[error("Checkout was not confirmed")]
    NotConfirmed,

    /// The order was refused or failed; the cart is unchanged.
    #[error("Checkout failed: {0}")]
    Rejected(String),

    /// Loading the catalog or an invoice failed.
    #[error(transparent)]
    Storefront(#[from] StorefrontError),
}

/// Result type for checkout client operations.
pub type Result<T> = std::result::Result<T, CartError>;
