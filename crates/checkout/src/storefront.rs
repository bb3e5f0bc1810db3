//! Backends a checkout client can sell through.

use async_trait::async_trait;
use common::{Order, OrderId, Product};
use domain::{
    CatalogService, CheckoutError, CheckoutService, CheckoutSettings, InvoiceError,
    InvoiceService, PlaceOrder,
};
use store::Store;

use crate::error::StorefrontError;

/// The server side of a checkout: catalog, order placement and invoices.
#[async_trait]
pub trait Storefront: Send + Sync {
    /// Loads the live catalog.
    async fn list_products(&self) -> Result<Vec<Product>, StorefrontError>;

    /// Submits an order; the server checks and decrements stock atomically.
    async fn place_order(&self, order: PlaceOrder) -> Result<Order, StorefrontError>;

    /// Downloads the PDF invoice for an order.
    async fn fetch_invoice(&self, order_id: OrderId) -> Result<Vec<u8>, StorefrontError>;
}

/// Calls the domain services in-process.
pub struct LocalStorefront<S: Store> {
    catalog: CatalogService<S>,
    checkout: CheckoutService<S>,
    invoices: InvoiceService<S>,
}

impl<S: Store + Clone> LocalStorefront<S> {
    pub fn new(store: S) -> Self {
        Self::with_settings(store, CheckoutSettings::default())
    }

    pub fn with_settings(store: S, settings: CheckoutSettings) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            checkout: CheckoutService::with_settings(store.clone(), settings),
            invoices: InvoiceService::new(store),
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        self.checkout.store()
    }
}

#[async_trait]
impl<S: Store + Clone> Storefront for LocalStorefront<S> {
    async fn list_products(&self) -> Result<Vec<Product>, StorefrontError> {
        self.catalog
            .list_products()
            .await
            .map_err(|e| StorefrontError::Server(e.to_string()))
    }

    async fn place_order(&self, order: PlaceOrder) -> Result<Order, StorefrontError> {
        self.checkout.place_order(order).await.map_err(|e| match e {
            CheckoutError::Storage(_) => {
                StorefrontError::Server("could not complete the order".to_string())
            }
            other => StorefrontError::Rejected(other.to_string()),
        })
    }

    async fn fetch_invoice(&self, order_id: OrderId) -> Result<Vec<u8>, StorefrontError> {
        self.invoices
            .get_invoice_pdf(order_id)
            .await
            .map_err(|e| match e {
                InvoiceError::NotFound(id) => StorefrontError::OrderNotFound(id),
                other => StorefrontError::Server(other.to_string()),
            })
    }
}
