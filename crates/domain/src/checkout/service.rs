//! The order transaction: stock check, decrement and order write as one unit.

use std::time::{Duration, Instant};

use common::{ClientId, NewOrder, Order, OrderStatus, UserId};
use store::{InventoryStore, OrderRepository, Store, Transaction, TransactionOptions};

use super::request::{PlaceOrder, TotalPolicy, ValidatedOrder};
use crate::error::CheckoutError;

/// Tuning for [`CheckoutService`].
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Attempts per checkout when the store reports a retryable conflict.
    pub max_attempts: u32,
    /// Base delay between attempts; attempt `n` waits `n * retry_backoff`.
    pub retry_backoff: Duration,
    /// Row lock wait limit applied to every checkout transaction.
    pub lock_timeout_ms: Option<u64>,
    pub total_policy: TotalPolicy,
    /// Client every sale is billed to.
    pub client_id: ClientId,
    /// Operator recorded on every sale.
    pub user_id: UserId,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff: Duration::from_millis(20),
            lock_timeout_ms: Some(5_000),
            total_policy: TotalPolicy::Trust,
            client_id: ClientId::new(1),
            user_id: UserId::new(1),
        }
    }
}

/// Places orders against a [`Store`].
///
/// A checkout either commits the stock decrements and the order together, or
/// leaves the store exactly as it found it.
pub struct CheckoutService<S: Store> {
    store: S,
    settings: CheckoutSettings,
}

impl<S: Store> CheckoutService<S> {
    /// Creates a checkout service with default settings.
    pub fn new(store: S) -> Self {
        Self::with_settings(store, CheckoutSettings::default())
    }

    pub fn with_settings(store: S, settings: CheckoutSettings) -> Self {
        Self { store, settings }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &CheckoutSettings {
        &self.settings
    }

    /// Validates the request, then atomically checks stock, decrements it and
    /// writes the order.
    ///
    /// Returns the created order with its persisted items.
    #[tracing::instrument(skip(self, request), fields(lines = request.items.len(), total = %request.total))]
    pub async fn place_order(&self, request: PlaceOrder) -> Result<Order, CheckoutError> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = Instant::now();

        let result = self.validate_and_place(&request).await;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("checkout_completed_total").increment(1);
                tracing::info!(order_id = %order.id, items = order.items.len(), "order placed");
            }
            Err(err) => {
                metrics::counter!("checkout_failed_total", "reason" => err.reason())
                    .increment(1);
                tracing::warn!(error = %err, reason = err.reason(), "checkout failed");
            }
        }

        result
    }

    async fn validate_and_place(&self, request: &PlaceOrder) -> Result<Order, CheckoutError> {
        let order = request.validate(self.settings.total_policy)?;
        let max_attempts = self.settings.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.attempt(&order).await {
                Err(CheckoutError::Storage(err)) if err.is_retryable() && attempt < max_attempts => {
                    metrics::counter!("checkout_retries_total").increment(1);
                    tracing::warn!(attempt, error = %err, "checkout transaction conflicted, retrying");
                    tokio::time::sleep(self.settings.retry_backoff * attempt).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Runs one transaction: commit on success, roll back on any error.
    async fn attempt(&self, order: &ValidatedOrder) -> Result<Order, CheckoutError> {
        let options = match self.settings.lock_timeout_ms {
            Some(ms) => TransactionOptions::with_lock_timeout(ms),
            None => TransactionOptions::new(),
        };
        let mut tx = self.store.begin(options).await?;

        match self.apply(&mut tx, order).await {
            Ok(created) => {
                tx.commit().await?;
                Ok(created)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn apply(&self, tx: &mut S::Tx, order: &ValidatedOrder) -> Result<Order, CheckoutError> {
        for (product_id, quantity) in order.demand() {
            let available = tx
                .get_stock(product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound(product_id))?;

            if available < quantity {
                return Err(CheckoutError::InsufficientStock {
                    product_id,
                    available,
                });
            }
        }

        for (product_id, quantity) in order.demand() {
            let remaining = tx.decrement_stock(product_id, quantity).await?;
            tracing::debug!(%product_id, quantity, remaining, "stock decremented");
        }

        let created = tx
            .create_order(NewOrder {
                total: order.total(),
                status: OrderStatus::Completed,
                client_id: self.settings.client_id,
                user_id: self.settings.user_id,
                items: order.items().to_vec(),
            })
            .await?;

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Money, NewProduct, ProductId};
    use store::InMemoryStore;

    use crate::checkout::LineRequest;

    async fn seed(store: &InMemoryStore, stock: u32, cents: i64) -> ProductId {
        store
            .create_product(NewProduct {
                name: "Widget".to_string(),
                price: Money::from_cents(cents),
                stock,
                description: None,
            })
            .await
            .unwrap()
            .id
    }

    fn request(lines: &[(ProductId, i64, i64)]) -> PlaceOrder {
        let items: Vec<_> = lines
            .iter()
            .map(|&(id, q, cents)| LineRequest::new(id, q, Money::from_cents(cents)))
            .collect();
        let total = PlaceOrder::new(Money::zero(), items.clone())
            .lines_total()
            .unwrap();
        PlaceOrder::new(total, items)
    }

    #[tokio::test]
    async fn test_place_order_decrements_and_persists() {
        let store = InMemoryStore::new();
        let product = seed(&store, 5, 1000).await;
        let service = CheckoutService::new(store.clone());

        let order = service
            .place_order(request(&[(product, 2, 1000)]))
            .await
            .unwrap();

        assert_eq!(order.total, Money::from_cents(2000));
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(store.stock_of(product).await, Some(3));
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_validation_failure_opens_no_transaction() {
        let store = InMemoryStore::new();
        let service = CheckoutService::new(store.clone());

        // Hold the store lock; validation must fail without waiting on it
        let _open = store.begin(TransactionOptions::new()).await.unwrap();
        let err = service.place_order(request(&[])).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[tokio::test]
    async fn test_retries_conflicts_then_succeeds() {
        let store = InMemoryStore::new();
        let product = seed(&store, 5, 1000).await;
        store.fail_next_commits(2).await;
        let service = CheckoutService::new(store.clone());

        let order = service.place_order(request(&[(product, 1, 1000)])).await;

        assert!(order.is_ok());
        assert_eq!(store.stock_of(product).await, Some(4));
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let store = InMemoryStore::new();
        let product = seed(&store, 5, 1000).await;
        store.fail_next_commits(3).await;
        let service = CheckoutService::new(store.clone());

        let err = service
            .place_order(request(&[(product, 1, 1000)]))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Storage(_)));
        assert_eq!(store.stock_of(product).await, Some(5));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_uses_configured_client_and_user() {
        let store = InMemoryStore::new();
        let product = seed(&store, 5, 1000).await;
        let settings = CheckoutSettings {
            client_id: ClientId::new(7),
            user_id: UserId::new(9),
            ..CheckoutSettings::default()
        };
        let service = CheckoutService::with_settings(store, settings);

        let order = service
            .place_order(request(&[(product, 1, 1000)]))
            .await
            .unwrap();

        assert_eq!(order.client_id, ClientId::new(7));
        assert_eq!(order.user_id, UserId::new(9));
    }
}
