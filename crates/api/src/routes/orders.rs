//! Order placement and invoice endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use common::{Order, OrderId};
use domain::PlaceOrder;
use store::Store;

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /orders`: place an order atomically.
///
/// Responds 200 with the created order. Validation, unknown products and
/// insufficient stock are 400; nothing is persisted in those cases.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<PlaceOrder>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let order = state.checkout.place_order(request).await?;
    Ok(Json(order))
}

/// `GET /orders/{id}`: load an order with its items.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id: OrderId = parse_id(&id, "order")?;
    let order = state
        .store
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {order_id} not found")))?;
    Ok(Json(order))
}

/// `GET /orders/{id}/pdf`: download the invoice.
#[tracing::instrument(skip(state))]
pub async fn pdf<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id: OrderId = parse_id(&id, "order")?;
    let bytes = state.invoices.get_invoice_pdf(order_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=invoice-{order_id}.pdf"),
            ),
        ],
        bytes,
    ))
}
