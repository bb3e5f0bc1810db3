//! Invoice data assembled from a persisted order.

use chrono::{DateTime, Utc};
use common::{Client, Money, OrderId};
use store::{Store, StoreError};

use super::pdf::render_pdf;
use crate::error::InvoiceError;

/// Heading printed when no shop name is configured.
pub const DEFAULT_SHOP_NAME: &str = "Hardware Store";

/// One printed invoice row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLine {
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Everything a renderer needs to print a sales receipt.
///
/// Built only from persisted order data: unit prices are the ones recorded at
/// sale time, not the current catalog prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub order_id: OrderId,
    pub date: DateTime<Utc>,
    pub client: Client,
    pub lines: Vec<InvoiceLine>,
    pub total: Money,
}

/// Loads invoices from a [`Store`].
pub struct InvoiceService<S: Store> {
    store: S,
    shop_name: String,
}

impl<S: Store> InvoiceService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            shop_name: DEFAULT_SHOP_NAME.to_string(),
        }
    }

    /// Sets the heading printed on rendered invoices.
    pub fn with_shop_name(mut self, shop_name: impl Into<String>) -> Self {
        self.shop_name = shop_name.into();
        self
    }

    pub fn shop_name(&self) -> &str {
        &self.shop_name
    }

    /// Builds the invoice for an order.
    ///
    /// Returns None if the order doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_invoice(&self, order_id: OrderId) -> Result<Option<Invoice>, StoreError> {
        let Some(order) = self.store.get_order(order_id).await? else {
            return Ok(None);
        };

        let client = match self.store.get_client(order.client_id).await? {
            Some(client) => client,
            None => {
                tracing::warn!(client_id = %order.client_id, "order references unknown client");
                Client {
                    id: order.client_id,
                    name: format!("Client #{}", order.client_id),
                    tax_id: "-".to_string(),
                }
            }
        };

        let mut lines = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let product_name = match self.store.get_product(item.product_id).await? {
                Some(product) => product.name,
                None => format!("Product #{}", item.product_id),
            };
            lines.push(InvoiceLine {
                product_name,
                quantity: item.quantity,
                unit_price: item.price,
                line_total: item.line_total(),
            });
        }

        Ok(Some(Invoice {
            order_id: order.id,
            date: order.date,
            client,
            lines,
            total: order.total,
        }))
    }

    /// Renders the invoice for an order as a PDF document.
    ///
    /// Fails with [`InvoiceError::NotFound`] rather than producing an empty
    /// document when the order doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_invoice_pdf(&self, order_id: OrderId) -> Result<Vec<u8>, InvoiceError> {
        let invoice = self
            .get_invoice(order_id)
            .await?
            .ok_or(InvoiceError::NotFound(order_id))?;
        let bytes = render_pdf(&invoice, &self.shop_name)?;
        tracing::debug!(%order_id, bytes = bytes.len(), "invoice rendered");
        Ok(bytes)
    }
}
