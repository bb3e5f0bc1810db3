//! Catalog and order records shared by the store, domain and clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ClientId, Money, OrderId, ProductId, UserId};

/// A sellable product as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    /// Units on hand. Never negative.
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker; deleted products stay referenceable by orders.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Fields required to create a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub stock: u32,
    #[serde(default)]
    pub description: Option<String>,
}

/// The party an order is billed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub tax_id: String,
}

/// Lifecycle status of an order.
///
/// Orders are written once, already completed; there are no intermediate
/// states to move through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Completed,
}

impl OrderStatus {
    /// Returns the value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Completed => "COMPLETED",
        }
    }

    /// Parses the value stored in the `status` column.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "COMPLETED" => Some(OrderStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price captured at the time of sale.
    pub price: Money,
}

impl OrderItem {
    /// Returns quantity * unit price.
    pub fn line_total(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// A persisted order with its items in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub total: Money,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
    pub client_id: ClientId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Sum of all line totals.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// A line to be written with a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

/// An order header plus lines, ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub total: Money,
    pub status: OrderStatus,
    pub client_id: ClientId,
    pub user_id: UserId,
    pub items: Vec<NewOrderItem>,
}
