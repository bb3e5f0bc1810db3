//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency and truncate
//! tables between tests, so they run serially.
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use serial_test::serial;
use sqlx::PgPool;
use store::{
    DEFAULT_CLIENT_ID, InventoryStore, Money, NewOrder, NewOrderItem, NewProduct, OrderRepository,
    OrderStatus, PostgresStore, Product, ProductId, Store, StoreError, Transaction,
    TransactionOptions, UserId,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders, products RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

async fn seed(store: &PostgresStore, name: &str, stock: u32, cents: i64) -> Product {
    store
        .create_product(NewProduct {
            name: name.to_string(),
            price: Money::from_cents(cents),
            stock,
            description: Some(format!("{name} description")),
        })
        .await
        .unwrap()
}

fn single_item_order(product_id: ProductId, quantity: u32, cents: i64) -> NewOrder {
    NewOrder {
        total: Money::from_cents(cents).multiply(quantity),
        status: OrderStatus::Completed,
        client_id: DEFAULT_CLIENT_ID,
        user_id: UserId::new(1),
        items: vec![NewOrderItem {
            product_id,
            quantity,
            price: Money::from_cents(cents),
        }],
    }
}

#[tokio::test]
#[serial]
async fn create_and_list_products() {
    let store = get_test_store().await;
    let hammer = seed(&store, "Hammer", 10, 1250).await;
    let saw = seed(&store, "Saw", 3, 3000).await;

    assert_eq!(hammer.price, Money::from_cents(1250));
    assert_eq!(hammer.description.as_deref(), Some("Hammer description"));

    let listed = store.list_products().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, saw.id);
    assert_eq!(listed[1].id, hammer.id);
}

#[tokio::test]
#[serial]
async fn soft_deleted_products_are_hidden_but_retained() {
    let store = get_test_store().await;
    let hammer = seed(&store, "Hammer", 10, 1250).await;

    assert!(store.delete_product(hammer.id).await.unwrap());
    assert!(!store.delete_product(hammer.id).await.unwrap());

    assert!(store.list_products().await.unwrap().is_empty());
    let retained = store.get_product(hammer.id).await.unwrap().unwrap();
    assert!(retained.deleted_at.is_some());
}

#[tokio::test]
#[serial]
async fn committed_order_and_stock_are_visible_together() {
    let store = get_test_store().await;
    let hammer = seed(&store, "Hammer", 10, 1250).await;

    let mut tx = store.begin(TransactionOptions::new()).await.unwrap();
    assert_eq!(tx.get_stock(hammer.id).await.unwrap(), Some(10));
    assert_eq!(tx.decrement_stock(hammer.id, 4).await.unwrap(), 6);
    let order = tx
        .create_order(single_item_order(hammer.id, 4, 1250))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let product = store.get_product(hammer.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 6);

    let stored = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.total, Money::from_cents(5000));
    assert_eq!(stored.status, OrderStatus::Completed);
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].price, Money::from_cents(1250));
    assert_eq!(stored.items[0].order_id, order.id);
}

#[tokio::test]
#[serial]
async fn rollback_discards_stock_and_order() {
    let store = get_test_store().await;
    let hammer = seed(&store, "Hammer", 10, 1250).await;

    let mut tx = store.begin(TransactionOptions::new()).await.unwrap();
    tx.decrement_stock(hammer.id, 4).await.unwrap();
    let order = tx
        .create_order(single_item_order(hammer.id, 4, 1250))
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    let product = store.get_product(hammer.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 10);
    assert!(store.get_order(order.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn decrement_reports_available_quantity() {
    let store = get_test_store().await;
    let hammer = seed(&store, "Hammer", 2, 1250).await;

    let mut tx = store.begin(TransactionOptions::new()).await.unwrap();
    let err = tx.decrement_stock(hammer.id, 3).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::InsufficientStock { available: 2, .. }
    ));

    let err = tx.decrement_stock(ProductId::new(9999), 1).await.unwrap_err();
    assert!(matches!(err, StoreError::ProductNotFound(_)));
}

#[tokio::test]
#[serial]
async fn concurrent_decrements_never_oversell() {
    let store = get_test_store().await;
    let hammer = seed(&store, "Hammer", 1, 1250).await;
    let product_id = hammer.id;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut tx = store.begin(TransactionOptions::new()).await?;
            tx.decrement_stock(product_id, 1).await?;
            tx.create_order(single_item_order(product_id, 1, 1250))
                .await?;
            tx.commit().await
        }));
    }

    let mut successes = 0;
    let mut shortages = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => successes += 1,
            Err(StoreError::InsufficientStock { available: 0, .. }) => shortages += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(shortages, 1);
    let product = store.get_product(hammer.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 0);
}

#[tokio::test]
#[serial]
async fn lock_timeout_aborts_waiting_transaction() {
    let store = get_test_store().await;
    let hammer = seed(&store, "Hammer", 5, 1250).await;

    let mut holder = store.begin(TransactionOptions::new()).await.unwrap();
    holder.get_stock(hammer.id).await.unwrap();

    let mut waiter = store
        .begin(TransactionOptions::with_lock_timeout(100))
        .await
        .unwrap();
    let err = waiter.get_stock(hammer.id).await.unwrap_err();
    assert!(matches!(err, StoreError::Timeout(_)));

    holder.rollback().await.unwrap();
}

#[tokio::test]
#[serial]
async fn order_for_unknown_product_is_rejected() {
    let store = get_test_store().await;

    let mut tx = store.begin(TransactionOptions::new()).await.unwrap();
    let err = tx
        .create_order(single_item_order(ProductId::new(4242), 1, 100))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ProductNotFound(id) if id == ProductId::new(4242)));
}

#[tokio::test]
#[serial]
async fn seeded_client_exists() {
    let store = get_test_store().await;
    let client = store.get_client(DEFAULT_CLIENT_ID).await.unwrap().unwrap();
    assert_eq!(client.name, "Walk-in customer");
}
