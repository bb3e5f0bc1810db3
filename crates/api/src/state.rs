//! Shared application state.

use domain::{CatalogService, CheckoutService, InvoiceService};
use store::Store;

use crate::config::Config;

/// Services shared by all handlers.
pub struct AppState<S: Store> {
    pub catalog: CatalogService<S>,
    pub checkout: CheckoutService<S>,
    pub invoices: InvoiceService<S>,
    pub store: S,
}

impl<S: Store + Clone> AppState<S> {
    /// Wires every service to one store using the configured settings.
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            checkout: CheckoutService::with_settings(store.clone(), config.checkout_settings()),
            invoices: InvoiceService::new(store.clone()).with_shop_name(config.shop_name.clone()),
            store,
        }
    }
}
