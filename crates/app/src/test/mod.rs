//! Test context for service-level tests.
//!
//! Services run against in-memory stores and the default fixture set.

use std::sync::Arc;

use rust_decimal::Decimal;
use trolley::{
    cart::{CartOwner, CustomerUuid, SessionToken},
    catalog::ProductUuid,
    fixtures::{Fixture, FixtureError},
    items::ItemOptions,
    pricing::NoCharges,
};

use crate::domain::{
    carts::{
        CartsEngine, CartsService, CartsServiceError,
        models::{NewCartItem, PricedCart},
        service::CartsBackends,
        stores::InMemoryCartStore,
    },
    catalog::{CatalogReader, StaticCatalog},
    coupons::InMemoryCouponsRepository,
    offers::InMemoryOffersRepository,
    orders::InMemoryOrdersGateway,
};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures");

pub(crate) struct TestContext {
    pub fixture: Fixture,
    pub carts: CartsEngine,
    pub store: InMemoryCartStore,
    pub orders: InMemoryOrdersGateway,
}

impl TestContext {
    pub fn load_fixture() -> Result<Fixture, FixtureError> {
        Fixture::from_set_in(FIXTURES, "default")
    }

    pub fn new() -> Result<Self, FixtureError> {
        let fixture = Self::load_fixture()?;
        let catalog = Arc::new(StaticCatalog::from_fixture(&fixture));

        Ok(Self::with_catalog(fixture, catalog))
    }

    /// Same stores and repositories, different catalog.
    pub fn with_catalog(fixture: Fixture, catalog: Arc<dyn CatalogReader>) -> Self {
        let store = InMemoryCartStore::new();
        let orders = InMemoryOrdersGateway::new();

        let carts = CartsEngine::new(
            CartsBackends {
                carts: Arc::new(store.clone()),
                catalog,
                coupons: Arc::new(InMemoryCouponsRepository::from_fixture(&fixture)),
                offers: Arc::new(InMemoryOffersRepository::from_fixture(&fixture)),
                orders: Arc::new(orders.clone()),
                charges: Arc::new(NoCharges),
            },
            "GBP",
        );

        Self {
            fixture,
            carts,
            store,
            orders,
        }
    }

    /// Add a fixture product by key. Unknown keys become a product the
    /// catalog has never heard of.
    pub async fn add(
        &self,
        owner: &CartOwner,
        key: &str,
        quantity: Decimal,
    ) -> Result<PricedCart, CartsServiceError> {
        let (product, variant) = self
            .fixture
            .product(key)
            .map_or((ProductUuid::new(), None), |snapshot| {
                (snapshot.product, snapshot.variant)
            });

        self.carts
            .add_item(
                owner,
                NewCartItem {
                    product,
                    variant,
                    quantity,
                    options: ItemOptions::new(),
                },
            )
            .await
    }
}

pub(crate) fn guest() -> CartOwner {
    CartOwner::Session(SessionToken::new("tab-1"))
}

pub(crate) fn customer(uuid: CustomerUuid) -> CartOwner {
    CartOwner::Customer(uuid)
}
