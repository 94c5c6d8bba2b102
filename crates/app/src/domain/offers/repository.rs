//! Offer Repositories

use async_trait::async_trait;
use sqlx::{Postgres, query, query_scalar, types::Json};
use trolley::{
    fixtures::Fixture,
    offers::{CartOffer, OfferUuid, Placement},
};

use crate::database::{Db, StoreError};

use super::OffersRepository;

const ACTIVE_OFFERS_SQL: &str = include_str!("sql/active_offers.sql");
const FIND_OFFER_SQL: &str = include_str!("sql/find_offer.sql");
const UPSERT_OFFER_SQL: &str = include_str!("sql/upsert_offer.sql");

#[derive(Debug, Clone)]
pub struct PgOffersRepository {
    db: Db,
}

impl PgOffersRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert or replace an offer definition.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn upsert_offer(&self, offer: &CartOffer) -> Result<(), StoreError> {
        query(UPSERT_OFFER_SQL)
            .bind(offer.uuid.into_uuid())
            .bind(offer.placement.as_str())
            .bind(offer.active)
            .bind(Json(offer))
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

#[async_trait]
impl OffersRepository for PgOffersRepository {
    async fn active_offers(&self, placement: Placement) -> Result<Vec<CartOffer>, StoreError> {
        let offers = query_scalar::<Postgres, Json<CartOffer>>(ACTIVE_OFFERS_SQL)
            .bind(placement.as_str())
            .fetch_all(self.db.pool())
            .await?;

        Ok(offers.into_iter().map(|Json(offer)| offer).collect())
    }

    async fn find_offer(&self, offer: OfferUuid) -> Result<Option<CartOffer>, StoreError> {
        let offer = query_scalar::<Postgres, Json<CartOffer>>(FIND_OFFER_SQL)
            .bind(offer.into_uuid())
            .fetch_optional(self.db.pool())
            .await?;

        Ok(offer.map(|Json(offer)| offer))
    }
}

/// Offers held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOffersRepository {
    offers: Vec<CartOffer>,
}

impl InMemoryOffersRepository {
    #[must_use]
    pub fn new(offers: impl IntoIterator<Item = CartOffer>) -> Self {
        let mut offers: Vec<CartOffer> = offers.into_iter().collect();

        offers.sort_by_key(|offer| offer.uuid);

        Self { offers }
    }

    #[must_use]
    pub fn from_fixture(fixture: &Fixture) -> Self {
        Self::new(fixture.offers().cloned())
    }
}

#[async_trait]
impl OffersRepository for InMemoryOffersRepository {
    async fn active_offers(&self, placement: Placement) -> Result<Vec<CartOffer>, StoreError> {
        Ok(self
            .offers
            .iter()
            .filter(|offer| offer.active && offer.placement == placement)
            .cloned()
            .collect())
    }

    async fn find_offer(&self, offer: OfferUuid) -> Result<Option<CartOffer>, StoreError> {
        Ok(self.offers.iter().find(|candidate| candidate.uuid == offer).cloned())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    const PRODUCTS: &str = r#"
products:
  kettle:
    name: Kettle
    price: "50.00 GBP"
"#;

    const OFFERS: &str = r#"
offers:
  basket:
    name: Basket offer
    placement: cart
    discount:
      type: percentage_off
      value: "10%"
  paused:
    name: Paused offer
    placement: cart
    active: false
    discount:
      type: percentage_off
      value: "50%"
  browse:
    name: Browse offer
    placement: product_page
    discount:
      type: amount_off
      value: "1.00 GBP"
"#;

    fn repository() -> Result<(Fixture, InMemoryOffersRepository), trolley::fixtures::FixtureError> {
        let mut fixture = Fixture::new();
        fixture.load_products_str(PRODUCTS)?.load_offers_str(OFFERS)?;

        let repository = InMemoryOffersRepository::from_fixture(&fixture);

        Ok((fixture, repository))
    }

    #[tokio::test]
    async fn active_offers_are_scoped_to_placement() -> TestResult {
        let (fixture, offers) = repository()?;

        let cart = offers.active_offers(Placement::Cart).await?;

        assert_eq!(
            cart.iter().map(|offer| offer.uuid).collect::<Vec<_>>(),
            vec![fixture.offer("basket")?.uuid]
        );

        Ok(())
    }

    #[tokio::test]
    async fn paused_offers_can_still_be_found() -> TestResult {
        let (fixture, offers) = repository()?;
        let paused = fixture.offer("paused")?;

        assert_eq!(offers.find_offer(paused.uuid).await?.as_ref(), Some(paused));
        assert_eq!(offers.find_offer(OfferUuid::new()).await?, None);

        Ok(())
    }
}
