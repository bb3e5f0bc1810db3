//! The session-scoped shopping cart.

use common::{Money, Product, ProductId};
use domain::{LineRequest, PlaceOrder};

use crate::error::{CartError, Result};

/// One cart row with the price captured when it was first added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Products selected for the current sale.
///
/// Stock checks against the product passed in are advisory; the server
/// checks again inside the order transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of a product.
    ///
    /// Refuses with [`CartError::OutOfStock`] and leaves the cart untouched if
    /// the new quantity would exceed `product.stock`.
    pub fn add_to_cart(&mut self, product: &Product) -> Result<&CartLine> {
        let position = self.lines.iter().position(|l| l.product_id == product.id);
        let in_cart = position.map_or(0, |i| self.lines[i].quantity);

        if in_cart >= product.stock {
            return Err(CartError::OutOfStock {
                product_id: product.id,
                name: product.name.clone(),
            });
        }

        let index = match position {
            Some(i) => {
                self.lines[i].quantity += 1;
                i
            }
            None => {
                self.lines.push(CartLine {
                    product_id: product.id,
                    name: product.name.clone(),
                    quantity: 1,
                    unit_price: product.price,
                });
                self.lines.len() - 1
            }
        };
        Ok(&self.lines[index])
    }

    /// Removes a product's line entirely.
    pub fn remove_from_cart(&mut self, product_id: ProductId) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.product_id == product_id)?;
        Some(self.lines.remove(index))
    }

    /// Sum of quantity * snapshot price over all lines.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Builds the order request for the current lines and total.
    pub fn to_order(&self) -> PlaceOrder {
        let items = self
            .lines
            .iter()
            .map(|l| LineRequest::new(l.product_id, i64::from(l.quantity), l.unit_price))
            .collect();
        PlaceOrder::new(self.total(), items)
    }
}
