//! Durable store for the point-of-sale system.
//!
//! Stock and order writes only happen through a transaction handle obtained
//! from [`Store::begin`]. The handle implements [`InventoryStore`] and
//! [`OrderRepository`], so both kinds of write commit or roll back together.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{
    Client, ClientId, Money, NewOrder, NewOrderItem, NewProduct, Order, OrderId, OrderItem,
    OrderStatus, Product, ProductId, UserId,
};
pub use error::{Result, StoreError};
pub use memory::{DEFAULT_CLIENT_ID, InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use store::{InventoryStore, OrderRepository, Store, Transaction, TransactionOptions};
