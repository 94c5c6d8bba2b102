//! Fixtures
//!
//! YAML fixture sets describing a catalog, coupons and cart offers. Sets live
//! under `{base_path}/{products,coupons,offers}/{name}.yml`.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    catalog::{CatalogSnapshot, CategoryUuid, ProductSnapshot, ProductUuid},
    coupons::{Coupon, normalize_code},
    fixtures::{
        coupons::CouponsFixture,
        offers::{FixtureKeys, OffersFixture},
        products::ProductsFixture,
    },
    offers::CartOffer,
    units::{StockLevel, UnitRule},
};

pub mod coupons;
pub mod offers;
pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Category not found
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Coupon not found
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// Offer not found
    #[error("Offer not found: {0}")]
    OfferNotFound(String),

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Product key -> snapshot
    products: FxHashMap<String, ProductSnapshot>,

    /// Category key -> id
    categories: FxHashMap<String, CategoryUuid>,

    /// Normalised code -> coupon
    coupons: FxHashMap<String, Coupon>,

    /// Offer key -> offer
    offers: FxHashMap<String, CartOffer>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl FixtureKeys for Fixture {
    fn product_uuid(&self, key: &str) -> Result<ProductUuid, FixtureError> {
        self.product(key).map(|product| product.product)
    }

    fn category_uuid(&self, key: &str) -> Result<CategoryUuid, FixtureError> {
        self.categories
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::CategoryNotFound(key.to_string()))
    }
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            products: FxHashMap::default(),
            categories: FxHashMap::default(),
            coupons: FxHashMap::default(),
            offers: FxHashMap::default(),
            currency: None,
        }
    }

    fn read(&self, kind: &str, name: &str) -> Result<String, FixtureError> {
        let file_path = self.base_path.join(kind).join(format!("{name}.yml"));

        Ok(fs::read_to_string(file_path)?)
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if there are currency mismatches.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("products", name)?;

        self.load_products_str(&contents)
    }

    /// Load products from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or if there are currency mismatches.
    pub fn load_products_str(&mut self, yaml: &str) -> Result<&mut Self, FixtureError> {
        let fixture: ProductsFixture = serde_norway::from_str(yaml)?;

        for (key, uuid) in fixture.categories {
            self.categories.insert(key, CategoryUuid::from_uuid(uuid));
        }

        for (key, product_fixture) in fixture.products {
            let (unit_price, currency) = products::parse_price(&product_fixture.price)?;

            if let Some(existing_currency) = self.currency {
                if existing_currency != currency {
                    return Err(FixtureError::CurrencyMismatch(
                        existing_currency.iso_alpha_code.to_string(),
                        currency.iso_alpha_code.to_string(),
                    ));
                }
            } else {
                self.currency = Some(currency);
            }

            let categories = product_fixture
                .categories
                .iter()
                .map(|category| {
                    *self
                        .categories
                        .entry(category.clone())
                        .or_insert_with(CategoryUuid::new)
                })
                .collect();

            let snapshot = ProductSnapshot {
                product: product_fixture
                    .uuid
                    .map_or_else(ProductUuid::new, ProductUuid::from_uuid),
                variant: None,
                name: product_fixture.name,
                unit_price,
                currency: currency.iso_alpha_code.to_string(),
                categories,
                unit: product_fixture.unit.map_or_else(UnitRule::pieces, UnitRule::from),
                stock: StockLevel {
                    available: product_fixture.stock,
                    backorder_allowed: product_fixture.backorder,
                },
                active: product_fixture.active,
            };

            self.products.insert(key, snapshot);
        }

        Ok(self)
    }

    /// Load coupons from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_coupons(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("coupons", name)?;

        self.load_coupons_str(&contents)
    }

    /// Load coupons from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or an amount is invalid.
    pub fn load_coupons_str(&mut self, yaml: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CouponsFixture = serde_norway::from_str(yaml)?;

        for (code, coupon_fixture) in fixture.coupons {
            let coupon = coupon_fixture.try_into_coupon(&code)?;

            self.coupons.insert(coupon.code.clone(), coupon);
        }

        Ok(self)
    }

    /// Load offers from a YAML fixture file. Products must be loaded first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or references unknown keys.
    pub fn load_offers(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("offers", name)?;

        self.load_offers_str(&contents)
    }

    /// Load offers from YAML text. Products must be loaded first.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or references unknown keys.
    pub fn load_offers_str(&mut self, yaml: &str) -> Result<&mut Self, FixtureError> {
        let fixture: OffersFixture = serde_norway::from_str(yaml)?;

        for (key, offer_fixture) in fixture.offers {
            let offer = offer_fixture.try_into_offer(&*self)?;

            self.offers.insert(key, offer);
        }

        Ok(self)
    }

    /// Load a complete fixture set (products, coupons and offers with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in("./fixtures", name)
    }

    /// Load a complete fixture set from a custom base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set_in(base_path: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(base_path);

        fixture
            .load_products(name)?
            .load_coupons(name)?
            .load_offers(name)?;

        Ok(fixture)
    }

    /// Get a product by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&ProductSnapshot, FixtureError> {
        self.products
            .get(key)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a coupon by code, matched case-insensitively
    ///
    /// # Errors
    ///
    /// Returns an error if the coupon is not found.
    pub fn coupon(&self, code: &str) -> Result<&Coupon, FixtureError> {
        let code = normalize_code(code);

        self.coupons
            .get(&code)
            .ok_or(FixtureError::CouponNotFound(code))
    }

    /// Get an offer by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the offer is not found.
    pub fn offer(&self, key: &str) -> Result<&CartOffer, FixtureError> {
        self.offers
            .get(key)
            .ok_or_else(|| FixtureError::OfferNotFound(key.to_string()))
    }

    /// All loaded products as a catalog snapshot
    pub fn catalog(&self) -> CatalogSnapshot {
        self.products.values().cloned().collect()
    }

    /// All loaded coupons
    pub fn coupons(&self) -> impl Iterator<Item = &Coupon> {
        self.coupons.values()
    }

    /// All loaded offers
    pub fn offers(&self) -> impl Iterator<Item = &CartOffer> {
        self.offers.values()
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
