//! HTTP orders client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use trolley::checkout::OrderRequest;

use super::{OrderReceipt, OrdersError, OrdersGateway};

const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

/// Submits orders to the order service: `POST {base_url}/orders`, keyed by
/// the cart uuid in the `Idempotency-Key` header.
#[derive(Debug, Clone)]
pub struct HttpOrdersClient {
    base_url: String,
    http: Client,
}

impl HttpOrdersClient {
    /// Create a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, OrdersError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl OrdersGateway for HttpOrdersClient {
    #[tracing::instrument(name = "orders.http.submit", skip(self, order), fields(cart = %order.cart), err)]
    async fn submit(&self, order: &OrderRequest) -> Result<OrderReceipt, OrdersError> {
        let url = format!("{}/orders", self.base_url);

        let response = self
            .http
            .post(&url)
            .header(IDEMPOTENCY_KEY, order.cart.to_string())
            .json(order)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(OrdersError::UnexpectedResponse(format!(
                "order request failed with status {status}: {text}"
            )));
        }

        Ok(response.json().await?)
    }
}
