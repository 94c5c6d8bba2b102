//! Coupons

use async_trait::async_trait;
use mockall::automock;
use trolley::coupons::Coupon;

use crate::database::StoreError;

mod repository;

pub use repository::{InMemoryCouponsRepository, PgCouponsRepository};

#[automock]
#[async_trait]
pub trait CouponsRepository: Send + Sync {
    /// Look up a coupon by its normalised code.
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, StoreError>;
}
