use async_trait::async_trait;

use crate::{Client, ClientId, NewOrder, NewProduct, Order, OrderId, Product, ProductId, Result};

/// Options applied to every transaction a store opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionOptions {
    /// How long a statement may wait for a row lock before the transaction
    /// is aborted. `None` waits indefinitely.
    pub lock_timeout_ms: Option<u64>,
}

impl TransactionOptions {
    /// Creates options that wait indefinitely for locks.
    pub fn new() -> Self {
        Self {
            lock_timeout_ms: None,
        }
    }

    /// Creates options that abort after waiting `ms` milliseconds for a lock.
    pub fn with_lock_timeout(ms: u64) -> Self {
        Self {
            lock_timeout_ms: Some(ms),
        }
    }
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Stock operations that run inside an open transaction.
///
/// Nothing done through this trait becomes visible to other transactions
/// until the enclosing [`Transaction`] commits.
#[async_trait]
pub trait InventoryStore: Send {
    /// Reads the live stock of a product and locks it for the rest of the
    /// transaction.
    ///
    /// Returns None if the product doesn't exist.
    async fn get_stock(&mut self, product_id: ProductId) -> Result<Option<u32>>;

    /// Decrements a product's stock if at least `amount` units are available.
    ///
    /// Returns the remaining stock, `InsufficientStock` with the available
    /// quantity, or `ProductNotFound`.
    async fn decrement_stock(&mut self, product_id: ProductId, amount: u32) -> Result<u32>;
}

/// Order writes that run inside an open transaction.
#[async_trait]
pub trait OrderRepository: Send {
    /// Inserts an order header and all of its items.
    ///
    /// Returns the order with store-assigned ids.
    async fn create_order(&mut self, order: NewOrder) -> Result<Order>;
}

/// An open unit of work against the store.
///
/// Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait Transaction: Send + Sized {
    /// Makes every change done through this transaction durable and visible.
    async fn commit(self) -> Result<()>;

    /// Discards every change done through this transaction.
    async fn rollback(self) -> Result<()>;
}

/// Core trait for point-of-sale store implementations.
///
/// Catalog reads and writes are committed on their own. Stock and order
/// mutation only happens through a transaction handle from [`Store::begin`].
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// The transaction handle type.
    type Tx: InventoryStore + OrderRepository + Transaction;

    /// Opens a transaction.
    async fn begin(&self, options: TransactionOptions) -> Result<Self::Tx>;

    /// Lists products that are not soft-deleted, newest id first.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Retrieves a product by id, including soft-deleted ones.
    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>>;

    /// Inserts a new product.
    async fn create_product(&self, product: NewProduct) -> Result<Product>;

    /// Marks a product as deleted.
    ///
    /// Returns false if no live product has this id.
    async fn delete_product(&self, product_id: ProductId) -> Result<bool>;

    /// Retrieves an order and its items.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Retrieves a client by id.
    async fn get_client(&self, client_id: ClientId) -> Result<Option<Client>>;
}

/// Converts a quantity to the store's integer column type.
pub(crate) fn to_db_quantity(quantity: u32) -> Result<i32> {
    i32::try_from(quantity).map_err(|_| {
        crate::StoreError::InvalidValue(format!("quantity {quantity} exceeds storage range"))
    })
}

/// Converts a stored integer back to a quantity.
pub(crate) fn from_db_quantity(value: i32) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| crate::StoreError::InvalidValue(format!("negative quantity {value} stored")))
}
