//! Orders Gateway
//!
//! Hands assembled orders to the external order subsystem.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trolley::{cart::CartUuid, checkout::OrderRequest};
use uuid::Uuid;

mod http;
mod memory;

pub use http::HttpOrdersClient;
pub use memory::InMemoryOrdersGateway;

/// Acknowledgement returned by the order subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order: Uuid,
    pub cart: CartUuid,
    pub currency: String,
    pub grand_total: i64,
}

#[derive(Debug, Error)]
pub enum OrdersError {
    #[error("order request failed")]
    Http(#[from] reqwest::Error),

    #[error("unexpected order response: {0}")]
    UnexpectedResponse(String),
}

#[automock]
#[async_trait]
pub trait OrdersGateway: Send + Sync {
    /// Submit an order for creation. Submitting again for the same
    /// `order.cart` returns the receipt of the order already created.
    async fn submit(&self, order: &OrderRequest) -> Result<OrderReceipt, OrdersError>;
}
