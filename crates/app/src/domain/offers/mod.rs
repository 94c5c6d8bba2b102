//! Cart Offers

use async_trait::async_trait;
use mockall::automock;
use trolley::offers::{CartOffer, OfferUuid, Placement};

use crate::database::StoreError;

mod repository;

pub use repository::{InMemoryOffersRepository, PgOffersRepository};

#[automock]
#[async_trait]
pub trait OffersRepository: Send + Sync {
    /// Switched-on offers configured for a placement.
    async fn active_offers(&self, placement: Placement) -> Result<Vec<CartOffer>, StoreError>;

    /// Look up an offer regardless of placement or state.
    async fn find_offer(&self, offer: OfferUuid) -> Result<Option<CartOffer>, StoreError>;
}
