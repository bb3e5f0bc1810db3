use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    Client, ClientId, NewOrder, NewProduct, Order, OrderId, OrderItem, Product, ProductId, Result,
    StoreError,
    store::{InventoryStore, OrderRepository, Store, Transaction, TransactionOptions},
};

/// The client every sale is billed to unless configured otherwise.
pub const DEFAULT_CLIENT_ID: ClientId = ClientId::new(1);

#[derive(Debug)]
struct MemoryState {
    products: BTreeMap<ProductId, Product>,
    clients: HashMap<ClientId, Client>,
    orders: BTreeMap<OrderId, Order>,
    next_product_id: i64,
    next_order_id: i64,
    next_item_id: i64,
    fail_on_create_order: bool,
    failing_commits: usize,
}

impl Default for MemoryState {
    fn default() -> Self {
        let mut clients = HashMap::new();
        clients.insert(
            DEFAULT_CLIENT_ID,
            Client {
                id: DEFAULT_CLIENT_ID,
                name: "Walk-in customer".to_string(),
                tax_id: "00-00000000-0".to_string(),
            },
        );

        Self {
            products: BTreeMap::new(),
            clients,
            orders: BTreeMap::new(),
            next_product_id: 1,
            next_order_id: 1,
            next_item_id: 1,
            fail_on_create_order: false,
            failing_commits: 0,
        }
    }
}

/// In-memory store implementation for testing and local runs.
///
/// A transaction holds the write lock for its whole lifetime, so transactions
/// are fully serialized. Changes are staged on the handle and only written
/// back to the shared state on commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new store seeded with the default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the committed stock of a product.
    pub async fn stock_of(&self, product_id: ProductId) -> Option<u32> {
        self.state
            .read()
            .await
            .products
            .get(&product_id)
            .map(|p| p.stock)
    }

    /// Adds or replaces a client record.
    pub async fn insert_client(&self, client: Client) {
        self.state.write().await.clients.insert(client.id, client);
    }

    /// Configures every order insert to fail until reset.
    pub async fn set_fail_on_create_order(&self, fail: bool) {
        self.state.write().await.fail_on_create_order = fail;
    }

    /// Makes the next `count` commits fail with a retryable conflict.
    pub async fn fail_next_commits(&self, count: usize) {
        self.state.write().await.failing_commits = count;
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self, options: TransactionOptions) -> Result<Self::Tx> {
        let lock = self.state.clone().write_owned();
        let guard = match options.lock_timeout_ms {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), lock)
                .await
                .map_err(|_| {
                    StoreError::Timeout(format!("could not acquire store lock within {ms}ms"))
                })?,
            None => lock.await,
        };

        let next_order_id = guard.next_order_id;
        let next_item_id = guard.next_item_id;
        Ok(InMemoryTransaction {
            guard,
            staged_stock: HashMap::new(),
            staged_orders: Vec::new(),
            next_order_id,
            next_item_id,
        })
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .rev()
            .filter(|p| !p.is_deleted())
            .cloned()
            .collect())
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&product_id).cloned())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let mut state = self.state.write().await;
        let id = ProductId::new(state.next_product_id);
        state.next_product_id += 1;

        let product = Product {
            id,
            name: product.name,
            description: product.description,
            price: product.price.rounded(),
            stock: product.stock,
            created_at: Utc::now(),
            deleted_at: None,
        };
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn delete_product(&self, product_id: ProductId) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.products.get_mut(&product_id) {
            Some(product) if !product.is_deleted() => {
                product.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn get_client(&self, client_id: ClientId) -> Result<Option<Client>> {
        Ok(self.state.read().await.clients.get(&client_id).cloned())
    }
}

/// Transaction handle for [`InMemoryStore`].
pub struct InMemoryTransaction {
    guard: OwnedRwLockWriteGuard<MemoryState>,
    staged_stock: HashMap<ProductId, u32>,
    staged_orders: Vec<Order>,
    next_order_id: i64,
    next_item_id: i64,
}

impl InMemoryTransaction {
    fn current_stock(&self, product_id: ProductId) -> Option<u32> {
        let product = self.guard.products.get(&product_id)?;
        Some(
            self.staged_stock
                .get(&product_id)
                .copied()
                .unwrap_or(product.stock),
        )
    }
}

#[async_trait]
impl InventoryStore for InMemoryTransaction {
    async fn get_stock(&mut self, product_id: ProductId) -> Result<Option<u32>> {
        Ok(self.current_stock(product_id))
    }

    async fn decrement_stock(&mut self, product_id: ProductId, amount: u32) -> Result<u32> {
        let available = self
            .current_stock(product_id)
            .ok_or(StoreError::ProductNotFound(product_id))?;

        let remaining = available
            .checked_sub(amount)
            .ok_or(StoreError::InsufficientStock {
                product_id,
                available,
            })?;

        self.staged_stock.insert(product_id, remaining);
        Ok(remaining)
    }
}

#[async_trait]
impl OrderRepository for InMemoryTransaction {
    async fn create_order(&mut self, order: NewOrder) -> Result<Order> {
        if self.guard.fail_on_create_order {
            return Err(StoreError::Unavailable(
                "order insert rejected".to_string(),
            ));
        }

        let order_id = OrderId::new(self.next_order_id);
        self.next_order_id += 1;

        let mut items = Vec::with_capacity(order.items.len());
        for item in order.items {
            if !self.guard.products.contains_key(&item.product_id) {
                return Err(StoreError::ProductNotFound(item.product_id));
            }
            items.push(OrderItem {
                id: self.next_item_id,
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price.rounded(),
            });
            self.next_item_id += 1;
        }

        let order = Order {
            id: order_id,
            total: order.total.rounded(),
            status: order.status,
            date: Utc::now(),
            client_id: order.client_id,
            user_id: order.user_id,
            items,
        };
        self.staged_orders.push(order.clone());
        Ok(order)
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(mut self) -> Result<()> {
        let state = &mut *self.guard;

        if state.failing_commits > 0 {
            state.failing_commits -= 1;
            return Err(StoreError::Conflict(
                "could not serialize access due to concurrent update".to_string(),
            ));
        }

        for (product_id, stock) in self.staged_stock.drain() {
            if let Some(product) = state.products.get_mut(&product_id) {
                product.stock = stock;
            }
        }
        for order in self.staged_orders.drain(..) {
            state.orders.insert(order.id, order);
        }
        state.next_order_id = self.next_order_id;
        state.next_item_id = self.next_item_id;

        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
