use thiserror::Error;

use crate::ProductId;

/// SQLSTATE codes PostgreSQL uses for transactions that may succeed on retry.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";
const QUERY_CANCELED: &str = "57014";

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A conditional stock decrement found fewer units than requested.
    #[error("Insufficient stock for product {product_id}: {available} available")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
    },

    /// The transaction lost a race with a concurrent one and was aborted.
    /// Retrying the whole transaction may succeed.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// The transaction waited too long for a row lock and was aborted.
    #[error("Transaction timed out: {0}")]
    Timeout(String),

    /// The store could not be reached or refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A value could not be represented in the store.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true if the failed transaction can be retried from scratch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.code().as_deref() {
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                    return StoreError::Conflict(db_err.message().to_string());
                }
                Some(LOCK_NOT_AVAILABLE) | Some(QUERY_CANCELED) => {
                    return StoreError::Timeout(db_err.message().to_string());
                }
                _ => {}
            }
        }
        if matches!(err, sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) {
            return StoreError::Unavailable(err.to_string());
        }
        StoreError::Database(err)
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
