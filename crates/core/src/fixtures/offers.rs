//! Cart Offer Fixtures
//!
//! Offers reference products and categories by their fixture keys.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    catalog::{CategoryUuid, ProductUuid},
    fixtures::{
        FixtureError,
        products::{parse_percentage, parse_price},
    },
    offers::{CartOffer, OfferCondition, OfferDiscount, OfferTarget, OfferUuid, Placement},
};

/// Wrapper for offers in YAML
#[derive(Debug, Deserialize)]
pub struct OffersFixture {
    /// Map of offer key -> offer fixture
    pub offers: FxHashMap<String, OfferFixture>,
}

/// Offer Fixture
#[derive(Debug, Deserialize)]
pub struct OfferFixture {
    /// Fixed offer id; generated when omitted
    #[serde(default)]
    pub uuid: Option<Uuid>,

    /// Display name
    pub name: String,

    /// Placement
    pub placement: Placement,

    /// Matching condition
    #[serde(default = "always")]
    pub condition: ConditionFixture,

    /// Discounted lines
    #[serde(default = "all_items")]
    pub target: TargetFixture,

    /// Discount
    pub discount: OfferDiscountFixture,

    /// Higher wins
    #[serde(default)]
    pub priority: i32,

    /// Switched on
    #[serde(default = "default_true")]
    pub active: bool,

    /// Start of the validity window
    #[serde(default)]
    pub starts_at: Option<Timestamp>,

    /// End of the validity window
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

fn always() -> ConditionFixture {
    ConditionFixture::Always
}

fn all_items() -> TargetFixture {
    TargetFixture::AllItems
}

fn default_true() -> bool {
    true
}

/// Offer condition from YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionFixture {
    /// Always matches
    Always,

    /// Minimum unit count
    MinItemCount {
        /// Units
        count: Decimal,
    },

    /// Minimum subtotal (e.g., "50.00 GBP")
    MinSubtotal {
        /// Price string
        amount: String,
    },

    /// Product key in the cart
    ContainsProduct {
        /// Product key
        product: String,
    },

    /// Category key in the cart
    ContainsCategory {
        /// Category key
        category: String,
    },

    /// Product key being viewed
    ViewingProduct {
        /// Product key
        product: String,
    },

    /// All of
    All {
        /// Children
        conditions: Vec<ConditionFixture>,
    },

    /// Any of
    Any {
        /// Children
        conditions: Vec<ConditionFixture>,
    },
}

/// Offer target from YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetFixture {
    /// Every line
    AllItems,

    /// Product keys
    Products {
        /// Keys
        products: Vec<String>,
    },

    /// Category keys
    Categories {
        /// Keys
        categories: Vec<String>,
    },
}

/// Offer discount from YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OfferDiscountFixture {
    /// Percentage off (e.g., "15%")
    PercentageOff {
        /// Percentage string
        value: String,
    },

    /// Amount off (e.g., "5.00 GBP")
    AmountOff {
        /// Price string
        value: String,
    },

    /// Unit price override (e.g., "2.50 GBP")
    AmountOverride {
        /// Price string
        value: String,
    },
}

/// Key lookups an offer fixture is resolved against.
pub trait FixtureKeys {
    /// Product id for a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    fn product_uuid(&self, key: &str) -> Result<ProductUuid, FixtureError>;

    /// Category id for a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    fn category_uuid(&self, key: &str) -> Result<CategoryUuid, FixtureError>;
}

impl ConditionFixture {
    fn resolve(self, keys: &impl FixtureKeys) -> Result<OfferCondition, FixtureError> {
        Ok(match self {
            Self::Always => OfferCondition::Always,
            Self::MinItemCount { count } => OfferCondition::MinItemCount { count },
            Self::MinSubtotal { amount } => OfferCondition::MinSubtotal {
                amount: parse_price(&amount)?.0,
            },
            Self::ContainsProduct { product } => OfferCondition::ContainsProduct {
                product: keys.product_uuid(&product)?,
            },
            Self::ContainsCategory { category } => OfferCondition::ContainsCategory {
                category: keys.category_uuid(&category)?,
            },
            Self::ViewingProduct { product } => OfferCondition::ViewingProduct {
                product: keys.product_uuid(&product)?,
            },
            Self::All { conditions } => OfferCondition::All {
                conditions: resolve_all(conditions, keys)?,
            },
            Self::Any { conditions } => OfferCondition::Any {
                conditions: resolve_all(conditions, keys)?,
            },
        })
    }
}

fn resolve_all(
    conditions: Vec<ConditionFixture>,
    keys: &impl FixtureKeys,
) -> Result<Vec<OfferCondition>, FixtureError> {
    conditions
        .into_iter()
        .map(|condition| condition.resolve(keys))
        .collect()
}

impl TargetFixture {
    fn resolve(self, keys: &impl FixtureKeys) -> Result<OfferTarget, FixtureError> {
        Ok(match self {
            Self::AllItems => OfferTarget::AllItems,
            Self::Products { products } => OfferTarget::Products {
                products: products
                    .iter()
                    .map(|key| keys.product_uuid(key))
                    .collect::<Result<_, _>>()?,
            },
            Self::Categories { categories } => OfferTarget::Categories {
                categories: categories
                    .iter()
                    .map(|key| keys.category_uuid(key))
                    .collect::<Result<_, _>>()?,
            },
        })
    }
}

impl TryFrom<OfferDiscountFixture> for OfferDiscount {
    type Error = FixtureError;

    fn try_from(fixture: OfferDiscountFixture) -> Result<Self, Self::Error> {
        Ok(match fixture {
            OfferDiscountFixture::PercentageOff { value } => Self::PercentageOff {
                rate: parse_percentage(&value)?,
            },
            OfferDiscountFixture::AmountOff { value } => Self::AmountOff {
                amount: parse_price(&value)?.0,
            },
            OfferDiscountFixture::AmountOverride { value } => Self::AmountOverride {
                amount: parse_price(&value)?.0,
            },
        })
    }
}

impl OfferFixture {
    /// Convert into a [`CartOffer`], resolving product and category keys.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is unknown or an amount cannot be parsed.
    pub fn try_into_offer(self, keys: &impl FixtureKeys) -> Result<CartOffer, FixtureError> {
        Ok(CartOffer {
            uuid: self.uuid.map_or_else(OfferUuid::new, OfferUuid::from_uuid),
            name: self.name,
            placement: self.placement,
            condition: self.condition.resolve(keys)?,
            target: self.target.resolve(keys)?,
            discount: self.discount.try_into()?,
            priority: self.priority,
            active: self.active,
            starts_at: self.starts_at,
            expires_at: self.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    struct Keys {
        mug: ProductUuid,
        kitchen: CategoryUuid,
    }

    impl FixtureKeys for Keys {
        fn product_uuid(&self, key: &str) -> Result<ProductUuid, FixtureError> {
            match key {
                "mug" => Ok(self.mug),
                other => Err(FixtureError::ProductNotFound(other.to_string())),
            }
        }

        fn category_uuid(&self, key: &str) -> Result<CategoryUuid, FixtureError> {
            match key {
                "kitchen" => Ok(self.kitchen),
                other => Err(FixtureError::CategoryNotFound(other.to_string())),
            }
        }
    }

    #[test]
    fn offer_fixture_resolves_nested_conditions() -> TestResult {
        let keys = Keys {
            mug: ProductUuid::new(),
            kitchen: CategoryUuid::new(),
        };

        let yaml = r#"
name: Kitchen bundle
placement: cart
priority: 3
condition:
  type: all
  conditions:
    - type: contains_category
      category: kitchen
    - type: any
      conditions:
        - type: min_item_count
          count: 3
        - type: min_subtotal
          amount: "40.00 GBP"
target:
  type: products
  products: [mug]
discount:
  type: amount_off
  value: "5.00 GBP"
"#;
        let fixture: OfferFixture = serde_norway::from_str(yaml)?;
        let offer = fixture.try_into_offer(&keys)?;

        assert_eq!(offer.priority, 3);
        assert_eq!(offer.discount, OfferDiscount::AmountOff { amount: 500 });
        assert_eq!(
            offer.target,
            OfferTarget::Products {
                products: vec![keys.mug]
            }
        );
        assert_eq!(
            offer.condition,
            OfferCondition::All {
                conditions: vec![
                    OfferCondition::ContainsCategory {
                        category: keys.kitchen
                    },
                    OfferCondition::Any {
                        conditions: vec![
                            OfferCondition::MinItemCount { count: dec!(3) },
                            OfferCondition::MinSubtotal { amount: 4_000 },
                        ],
                    },
                ],
            }
        );

        Ok(())
    }

    #[test]
    fn offer_fixture_rejects_unknown_product_keys() -> TestResult {
        let keys = Keys {
            mug: ProductUuid::new(),
            kitchen: CategoryUuid::new(),
        };

        let yaml = r#"
name: Teapot deal
placement: product_page
condition:
  type: viewing_product
  product: teapot
discount:
  type: percentage_off
  value: "10%"
"#;
        let fixture: OfferFixture = serde_norway::from_str(yaml)?;
        let result = fixture.try_into_offer(&keys);

        assert!(matches!(result, Err(FixtureError::ProductNotFound(key)) if key == "teapot"));

        Ok(())
    }
}
