//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CatalogError, CheckoutError, InvoiceError};
use store::StoreError;

/// Message returned for failures the client can't act on.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order placement error.
    Checkout(CheckoutError),
    /// Catalog management error.
    Catalog(CatalogError),
    /// Invoice lookup or rendering error.
    Invoice(InvoiceError),
    /// Store error outside of a domain service.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Catalog(err) => catalog_error_to_response(err),
            ApiError::Invoice(err) => invoice_error_to_response(err),
            ApiError::Store(err) => internal(&err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn internal(err: &dyn std::error::Error) -> (StatusCode, String) {
    tracing::error!(error = %err, "internal server error");
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::Validation(_)
        | CheckoutError::ProductNotFound(_)
        | CheckoutError::InsufficientStock { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::Storage(_) => internal(&err),
    }
}

fn catalog_error_to_response(err: CatalogError) -> (StatusCode, String) {
    match &err {
        CatalogError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CatalogError::Store(_) => internal(&err),
    }
}

fn invoice_error_to_response(err: InvoiceError) -> (StatusCode, String) {
    match &err {
        InvoiceError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        InvoiceError::Store(_) | InvoiceError::Render(_) => internal(&err),
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        ApiError::Invoice(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
