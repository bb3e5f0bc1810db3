//! Identifiers and records shared across the point-of-sale crates.

pub mod model;
pub mod money;
pub mod types;

pub use model::{
    Client, NewOrder, NewOrderItem, NewProduct, Order, OrderItem, OrderStatus, Product,
};
pub use money::Money;
pub use types::{ClientId, OrderId, ProductId, UserId};
