//! App Context

use std::{path::PathBuf, sync::Arc, time::Duration};

use decimal_percentage::Percentage;
use thiserror::Error;
use tracing::info;
use trolley::{
    fixtures::{Fixture, FixtureError},
    money::{AmountError, find_currency},
};

use crate::{
    charges::ConfiguredCharges,
    database::{self, Db},
    domain::{
        carts::{
            CartsEngine, CartsService,
            service::CartsBackends,
            stores::{CartStore, InMemoryCartStore, PgCartStore},
        },
        catalog::{CatalogError, CatalogReader, HttpCatalogClient, StaticCatalog},
        coupons::{CouponsRepository, InMemoryCouponsRepository, PgCouponsRepository},
        offers::{InMemoryOffersRepository, OffersRepository, PgOffersRepository},
        orders::{HttpOrdersClient, InMemoryOrdersGateway, OrdersError, OrdersGateway},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to load fixtures")]
    Fixtures(#[source] FixtureError),

    #[error("failed to build catalog client")]
    Catalog(#[source] CatalogError),

    #[error("failed to build orders client")]
    Orders(#[source] OrdersError),

    #[error("invalid default currency")]
    Currency(#[source] AmountError),
}

/// Where the services read from and write to. Anything left unset falls back
/// to an in-memory or fixture-backed implementation.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub database_url: Option<String>,
    pub catalog_url: Option<String>,
    pub orders_url: Option<String>,
    pub fixtures_path: PathBuf,
    pub fixture_set: String,
    pub upstream_timeout: Duration,
    pub currency: String,
    pub shipping_flat: i64,
    pub free_shipping_threshold: Option<i64>,
    pub tax_rate: Percentage,
}

#[derive(Clone)]
pub struct AppContext {
    pub carts: Arc<dyn CartsService>,
}

impl AppContext {
    /// Build application context from settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the database is unreachable, fixtures fail to
    /// load, or an upstream client cannot be built.
    pub async fn from_settings(settings: &AppSettings) -> Result<Self, AppInitError> {
        let currency = find_currency(&settings.currency.trim().to_uppercase())
            .map_err(AppInitError::Currency)?;

        let fixture = if settings.database_url.is_none() || settings.catalog_url.is_none() {
            let fixture = Fixture::from_set_in(settings.fixtures_path.clone(), &settings.fixture_set)
                .map_err(AppInitError::Fixtures)?;

            Some(fixture)
        } else {
            None
        };

        let Storage {
            carts,
            coupons,
            offers,
        } = Storage::open(settings.database_url.as_deref(), fixture.as_ref()).await?;

        let catalog: Arc<dyn CatalogReader> = match &settings.catalog_url {
            Some(url) => Arc::new(
                HttpCatalogClient::new(url, settings.upstream_timeout)
                    .map_err(AppInitError::Catalog)?,
            ),
            None => {
                info!("CATALOG_URL not set, serving the fixture catalog");

                Arc::new(
                    fixture
                        .as_ref()
                        .map(StaticCatalog::from_fixture)
                        .unwrap_or_default(),
                )
            }
        };

        let orders: Arc<dyn OrdersGateway> = match &settings.orders_url {
            Some(url) => Arc::new(
                HttpOrdersClient::new(url, settings.upstream_timeout)
                    .map_err(AppInitError::Orders)?,
            ),
            None => {
                info!("ORDERS_URL not set, orders are kept in memory");

                Arc::new(InMemoryOrdersGateway::new())
            }
        };

        let charges = Arc::new(ConfiguredCharges::new(
            currency.iso_alpha_code,
            settings.shipping_flat,
            settings.free_shipping_threshold,
            settings.tax_rate,
        ));

        let engine = CartsEngine::new(
            CartsBackends {
                carts,
                catalog,
                coupons,
                offers,
                orders,
                charges,
            },
            currency.iso_alpha_code,
        );

        Ok(Self {
            carts: Arc::new(engine),
        })
    }
}

struct Storage {
    carts: Arc<dyn CartStore>,
    coupons: Arc<dyn CouponsRepository>,
    offers: Arc<dyn OffersRepository>,
}

impl Storage {
    async fn open(database_url: Option<&str>, fixture: Option<&Fixture>) -> Result<Self, AppInitError> {
        let Some(url) = database_url else {
            info!("DATABASE_URL not set, using in-memory storage");

            return Ok(Self {
                carts: Arc::new(InMemoryCartStore::new()),
                coupons: Arc::new(
                    fixture
                        .map(InMemoryCouponsRepository::from_fixture)
                        .unwrap_or_default(),
                ),
                offers: Arc::new(
                    fixture
                        .map(InMemoryOffersRepository::from_fixture)
                        .unwrap_or_default(),
                ),
            });
        };

        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);

        info!("using postgres storage");

        Ok(Self {
            carts: Arc::new(PgCartStore::new(db.clone())),
            coupons: Arc::new(PgCouponsRepository::new(db.clone())),
            offers: Arc::new(PgOffersRepository::new(db)),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;
    use trolley::items::ItemOptions;

    use crate::{domain::carts::models::NewCartItem, test::guest};

    use super::*;

    fn settings() -> AppSettings {
        AppSettings {
            database_url: None,
            catalog_url: None,
            orders_url: None,
            fixtures_path: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures")),
            fixture_set: "default".to_string(),
            upstream_timeout: Duration::from_secs(2),
            currency: "gbp".to_string(),
            shipping_flat: 395,
            free_shipping_threshold: Some(5_000),
            tax_rate: Percentage::from(0.2),
        }
    }

    #[tokio::test]
    async fn falls_back_to_fixtures_and_memory() -> TestResult {
        let context = AppContext::from_settings(&settings()).await?;
        let fixture = Fixture::from_set_in(settings().fixtures_path, "default")?;
        let mug = fixture.product("mug")?;

        let priced = context
            .carts
            .add_item(
                &guest(),
                NewCartItem {
                    product: mug.product,
                    variant: mug.variant,
                    quantity: dec!(2),
                    options: ItemOptions::new(),
                },
            )
            .await?;

        assert_eq!(priced.cart.currency, "GBP");
        assert_eq!(priced.cart.totals.subtotal, 1_700);
        assert_eq!(priced.cart.totals.shipping_total, 395);
        assert_eq!(priced.cart.totals.tax_total, 340);
        assert_eq!(priced.cart.totals.grand_total, 2_435);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_currencies_are_rejected() {
        let mut settings = settings();
        settings.currency = "ZZZ".to_string();

        let result = AppContext::from_settings(&settings).await;

        assert!(
            matches!(result, Err(AppInitError::Currency(_))),
            "expected Currency error"
        );
    }
}
