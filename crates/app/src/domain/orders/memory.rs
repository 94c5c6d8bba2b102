//! In-memory orders gateway

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use trolley::checkout::OrderRequest;
use uuid::Uuid;

use super::{OrderReceipt, OrdersError, OrdersGateway};

/// Accepts every order and keeps it for inspection. A cart already ordered
/// gets its first receipt back.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrdersGateway {
    orders: Arc<RwLock<Vec<(Uuid, OrderRequest)>>>,
}

impl InMemoryOrdersGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders submitted so far, oldest first.
    pub async fn submitted(&self) -> Vec<(Uuid, OrderRequest)> {
        self.orders.read().await.clone()
    }
}

fn receipt(uuid: Uuid, order: &OrderRequest) -> OrderReceipt {
    OrderReceipt {
        order: uuid,
        cart: order.cart,
        currency: order.currency.clone(),
        grand_total: order.totals.grand_total,
    }
}

#[async_trait]
impl OrdersGateway for InMemoryOrdersGateway {
    async fn submit(&self, order: &OrderRequest) -> Result<OrderReceipt, OrdersError> {
        let mut orders = self.orders.write().await;

        let ordered = orders
            .iter()
            .find(|(_, existing)| existing.cart == order.cart);

        if let Some((uuid, existing)) = ordered {
            return Ok(receipt(*uuid, existing));
        }

        let uuid = Uuid::now_v7();

        orders.push((uuid, order.clone()));

        Ok(receipt(uuid, order))
    }
}
