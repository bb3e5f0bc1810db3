//! A storefront reached over the point-of-sale HTTP API.

use async_trait::async_trait;
use common::{Order, OrderId, Product};
use domain::PlaceOrder;
use reqwest::{Response, StatusCode};
use serde::Deserialize;

use crate::error::StorefrontError;
use crate::storefront::Storefront;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Talks to a running API server, e.g. `http://localhost:3000/api`.
#[derive(Debug, Clone)]
pub struct HttpStorefront {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStorefront {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Uses a preconfigured client (timeouts, proxies).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Turns a non-success response into an error, keeping the server's message.
async fn error_from(response: Response) -> StorefrontError {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };

    if status.is_server_error() {
        StorefrontError::Server(message)
    } else {
        StorefrontError::Rejected(message)
    }
}

#[async_trait]
impl Storefront for HttpStorefront {
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn list_products(&self) -> Result<Vec<Product>, StorefrontError> {
        let response = self.client.get(self.url("/products")).send().await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(response.json().await?)
    }

    #[tracing::instrument(skip(self, order), fields(base_url = %self.base_url, lines = order.items.len()))]
    async fn place_order(&self, order: PlaceOrder) -> Result<Order, StorefrontError> {
        let response = self
            .client
            .post(self.url("/orders"))
            .json(&order)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(response.json().await?)
    }

    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_invoice(&self, order_id: OrderId) -> Result<Vec<u8>, StorefrontError> {
        let response = self
            .client
            .get(self.url(&format!("/orders/{order_id}/pdf")))
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(StorefrontError::OrderNotFound(order_id)),
            status if status.is_success() => Ok(response.bytes().await?.to_vec()),
            _ => Err(error_from(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let storefront = HttpStorefront::new("http://localhost:3000/api/");
        assert_eq!(storefront.base_url(), "http://localhost:3000/api");
        assert_eq!(
            storefront.url("/orders/7/pdf"),
            "http://localhost:3000/api/orders/7/pdf"
        );
    }
}
