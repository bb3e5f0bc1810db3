//! The point-of-sale checkout flow.

use common::{Money, Order, OrderId, Product, ProductId};

use crate::cart::{Cart, CartLine};
use crate::error::{CartError, Result};
use crate::storefront::Storefront;

/// Drives one operator session: browse the catalog, fill the cart, confirm
/// and submit the sale.
pub struct CheckoutClient<B: Storefront> {
    storefront: B,
    cart: Cart,
    catalog: Vec<Product>,
    last_order_id: Option<OrderId>,
}

impl<B: Storefront> CheckoutClient<B> {
    /// Creates a client with an empty cart and no catalog loaded.
    pub fn new(storefront: B) -> Self {
        Self {
            storefront,
            cart: Cart::new(),
            catalog: Vec::new(),
            last_order_id: None,
        }
    }

    pub fn storefront(&self) -> &B {
        &self.storefront
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The catalog as of the last refresh.
    pub fn catalog(&self) -> &[Product] {
        &self.catalog
    }

    /// Id of the most recent successful sale in this session.
    pub fn last_order_id(&self) -> Option<OrderId> {
        self.last_order_id
    }

    /// Reloads the catalog, including current stock levels.
    pub async fn refresh_catalog(&mut self) -> Result<&[Product]> {
        self.catalog = self.storefront.list_products().await?;
        tracing::debug!(products = self.catalog.len(), "catalog refreshed");
        Ok(&self.catalog)
    }

    /// Adds one unit of a catalog product to the cart.
    ///
    /// The stock check uses the last loaded catalog.
    pub fn add_to_cart(&mut self, product_id: ProductId) -> Result<&CartLine> {
        let product = self
            .catalog
            .iter()
            .find(|p| p.id == product_id)
            .ok_or(CartError::UnknownProduct(product_id))?;
        self.cart.add_to_cart(product)
    }

    pub fn remove_from_cart(&mut self, product_id: ProductId) -> Option<CartLine> {
        self.cart.remove_from_cart(product_id)
    }

    pub fn total(&self) -> Money {
        self.cart.total()
    }

    /// Submits the cart as one order after the operator confirms it.
    ///
    /// `confirm` sees the cart and its total; returning false cancels without
    /// contacting the storefront. On success the cart is emptied and the
    /// catalog reloaded. On failure the cart is left as it was so the
    /// operator can adjust it and retry.
    #[tracing::instrument(skip(self, confirm), fields(lines = self.cart.lines().len()))]
    pub async fn checkout<F>(&mut self, confirm: F) -> Result<Order>
    where
        F: FnOnce(&Cart, Money) -> bool,
    {
        if self.cart.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let total = self.cart.total();
        if !confirm(&self.cart, total) {
            return Err(CartError::NotConfirmed);
        }

        let order = self
            .storefront
            .place_order(self.cart.to_order())
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "checkout rejected");
                CartError::Rejected(e.to_string())
            })?;

        tracing::info!(order_id = %order.id, total = %order.total, "sale completed");
        self.cart.clear();
        self.last_order_id = Some(order.id);

        if let Err(err) = self.refresh_catalog().await {
            tracing::warn!(error = %err, "catalog refresh after checkout failed");
        }

        Ok(order)
    }

    /// Downloads the PDF invoice for an order.
    pub async fn invoice(&self, order_id: OrderId) -> Result<Vec<u8>> {
        Ok(self.storefront.fetch_invoice(order_id).await?)
    }
}
