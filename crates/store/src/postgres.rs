use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{
    PgPool, Postgres, Row,
    postgres::{PgPoolOptions, PgRow},
};

use crate::{
    Client, ClientId, Money, NewOrder, NewProduct, Order, OrderId, OrderItem, OrderStatus,
    Product, ProductId, Result, StoreError, UserId,
    store::{
        InventoryStore, OrderRepository, Store, Transaction, TransactionOptions, from_db_quantity,
        to_db_quantity,
    },
};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, created_at, deleted_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::new(row.try_get::<Decimal, _>("price")?),
            stock: from_db_quantity(row.try_get("stock")?)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            deleted_at: row.try_get::<Option<DateTime<Utc>>, _>("deleted_at")?,
        })
    }

    fn row_to_item(row: PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            id: row.try_get("id")?,
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: from_db_quantity(row.try_get("quantity")?)?,
            price: Money::new(row.try_get::<Decimal, _>("price")?),
        })
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            total: Money::new(row.try_get::<Decimal, _>("total")?),
            status: OrderStatus::parse(&status)
                .ok_or_else(|| StoreError::InvalidValue(format!("unknown order status {status}")))?,
            date: row.try_get::<DateTime<Utc>, _>("date")?,
            client_id: ClientId::new(row.try_get("client_id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            items,
        })
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTransaction;

    async fn begin(&self, options: TransactionOptions) -> Result<Self::Tx> {
        let mut tx = self.pool.begin().await?;

        if let Some(ms) = options.lock_timeout_ms {
            // SET LOCAL does not accept bind parameters
            sqlx::query(&format!("SET LOCAL lock_timeout = {ms}"))
                .execute(&mut *tx)
                .await?;
        }

        Ok(PostgresTransaction { tx })
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(product_id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (name, description, price, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(to_db_quantity(product.stock)?)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(row)
    }

    async fn delete_product(&self, product_id: ProductId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(product_id.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let Some(header) = sqlx::query(
            "SELECT id, total, status, date, client_id, user_id FROM orders WHERE id = $1",
        )
        .bind(order_id.get())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, price
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id.get())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Self::row_to_item)
        .collect::<Result<Vec<_>>>()?;

        Self::row_to_order(&header, items).map(Some)
    }

    async fn get_client(&self, client_id: ClientId) -> Result<Option<Client>> {
        let row = sqlx::query("SELECT id, name, tax_id FROM clients WHERE id = $1")
            .bind(client_id.get())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Client {
                id: ClientId::new(row.try_get("id")?),
                name: row.try_get("name")?,
                tax_id: row.try_get("tax_id")?,
            })),
            None => Ok(None),
        }
    }
}

/// Transaction handle for [`PostgresStore`].
///
/// Wraps a `sqlx` transaction; sqlx rolls it back when dropped uncommitted.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl InventoryStore for PostgresTransaction {
    async fn get_stock(&mut self, product_id: ProductId) -> Result<Option<u32>> {
        let stock: Option<i32> =
            sqlx::query_scalar("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
                .bind(product_id.get())
                .fetch_optional(&mut *self.tx)
                .await?;

        stock.map(from_db_quantity).transpose()
    }

    async fn decrement_stock(&mut self, product_id: ProductId, amount: u32) -> Result<u32> {
        let amount = to_db_quantity(amount)?;

        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE products SET stock = stock - $2
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(product_id.get())
        .bind(amount)
        .fetch_optional(&mut *self.tx)
        .await?;

        if let Some(remaining) = remaining {
            return from_db_quantity(remaining);
        }

        // Nothing updated: either the row is missing or stock is short
        let available: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id.get())
            .fetch_optional(&mut *self.tx)
            .await?;

        match available {
            Some(available) => Err(StoreError::InsufficientStock {
                product_id,
                available: from_db_quantity(available)?,
            }),
            None => Err(StoreError::ProductNotFound(product_id)),
        }
    }
}

#[async_trait]
impl OrderRepository for PostgresTransaction {
    async fn create_order(&mut self, order: NewOrder) -> Result<Order> {
        let header = sqlx::query(
            r#"
            INSERT INTO orders (total, status, client_id, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, total, status, date, client_id, user_id
            "#,
        )
        .bind(order.total.amount())
        .bind(order.status.as_str())
        .bind(order.client_id.get())
        .bind(order.user_id.get())
        .fetch_one(&mut *self.tx)
        .await?;

        let order_id = OrderId::new(header.try_get("id")?);

        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let row = sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                RETURNING id, order_id, product_id, quantity, price
                "#,
            )
            .bind(order_id.get())
            .bind(item.product_id.get())
            .bind(to_db_quantity(item.quantity)?)
            .bind(item.price.amount())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("order_items_product_id_fkey")
                {
                    return StoreError::ProductNotFound(item.product_id);
                }
                StoreError::from(e)
            })?;

            items.push(PostgresStore::row_to_item(row)?);
        }

        PostgresStore::row_to_order(&header, items)
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
