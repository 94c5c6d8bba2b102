//! Offer Conditions
//!
//! Nested boolean conditions over cart contents and the viewing context.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    cart::Cart,
    catalog::{CategoryUuid, ProductUuid},
};

/// When an offer matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OfferCondition {
    /// Always matches.
    Always,

    /// Cart holds at least `count` units.
    MinItemCount {
        /// Required units
        count: Decimal,
    },

    /// Cart subtotal reaches `amount` minor units.
    MinSubtotal {
        /// Required subtotal
        amount: i64,
    },

    /// Cart contains the product.
    ContainsProduct {
        /// Required product
        product: ProductUuid,
    },

    /// Cart contains a product in the category.
    ContainsCategory {
        /// Required category
        category: CategoryUuid,
    },

    /// Shopper is viewing the product.
    ViewingProduct {
        /// Viewed product
        product: ProductUuid,
    },

    /// Every child condition matches. Empty matches.
    All {
        /// Child conditions
        conditions: Vec<OfferCondition>,
    },

    /// At least one child condition matches. Empty never matches.
    Any {
        /// Child conditions
        conditions: Vec<OfferCondition>,
    },
}

/// Cart facts a condition is evaluated against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CartFacts<'a> {
    pub(crate) cart: &'a Cart,
    pub(crate) subtotal: i64,
    pub(crate) viewing: Option<ProductUuid>,
}

impl OfferCondition {
    pub(crate) fn holds(&self, facts: &CartFacts<'_>) -> bool {
        match self {
            Self::Always => true,
            Self::MinItemCount { count } => facts.cart.item_units() >= *count,
            Self::MinSubtotal { amount } => facts.subtotal >= *amount,
            Self::ContainsProduct { product } => facts
                .cart
                .items
                .iter()
                .any(|item| item.product == *product),
            Self::ContainsCategory { category } => facts
                .cart
                .items
                .iter()
                .any(|item| item.in_category(*category)),
            Self::ViewingProduct { product } => facts.viewing == Some(*product),
            Self::All { conditions } => conditions.iter().all(|condition| condition.holds(facts)),
            Self::Any { conditions } => conditions.iter().any(|condition| condition.holds(facts)),
        }
    }
}
