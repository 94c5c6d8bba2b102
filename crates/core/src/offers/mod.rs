//! Cart offers
//!
//! Placement-scoped promotional discounts. At most one offer is accepted per
//! cart; accepting another supersedes it. Offers are re-evaluated on every
//! pricing pass and expire as soon as the cart stops matching.

use std::{fmt, str::FromStr};

use decimal_percentage::Percentage;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    catalog::{CategoryUuid, ProductUuid},
    ids::TypedUuid,
    money::{AmountError, percentage_serde},
};

mod conditions;
mod discounts;
mod resolver;

pub use conditions::OfferCondition;
pub use discounts::LineDiscount;
pub use resolver::{Acceptance, OfferContext, ResolvedOffer, accept, evaluate, resolve};

/// Offer UUID
pub type OfferUuid = TypedUuid<CartOffer>;

/// Where in the storefront an offer may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Cart page
    Cart,

    /// Product detail page
    ProductPage,

    /// Checkout page
    Checkout,
}

impl Placement {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::ProductPage => "product_page",
            Self::Checkout => "checkout",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown placement name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown placement: {0}")]
pub struct UnknownPlacement(pub String);

impl FromStr for Placement {
    type Err = UnknownPlacement;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cart" => Ok(Self::Cart),
            "product_page" => Ok(Self::ProductPage),
            "checkout" => Ok(Self::Checkout),
            other => Err(UnknownPlacement(other.to_string())),
        }
    }
}

/// Which lines an offer discounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OfferTarget {
    /// Every line
    AllItems,

    /// Lines for any of these products
    Products {
        /// Targeted products
        products: Vec<ProductUuid>,
    },

    /// Lines in any of these categories
    Categories {
        /// Targeted categories
        categories: Vec<CategoryUuid>,
    },
}

/// How an offer discounts its target lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OfferDiscount {
    /// Percentage off each target line
    PercentageOff {
        /// Rate
        #[serde(with = "percentage_serde")]
        rate: Percentage,
    },

    /// Fixed amount off, spread across target lines by value
    AmountOff {
        /// Amount in minor units
        amount: i64,
    },

    /// Replace the unit price of each target line
    AmountOverride {
        /// Unit price in minor units
        amount: i64,
    },
}

/// A configured cart offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartOffer {
    /// Offer id; lower ids win priority ties
    pub uuid: OfferUuid,

    /// Display name
    pub name: String,

    /// Where the offer is shown
    pub placement: Placement,

    /// When the offer matches
    pub condition: OfferCondition,

    /// Which lines it discounts
    pub target: OfferTarget,

    /// The discount itself
    pub discount: OfferDiscount,

    /// Higher wins
    #[serde(default)]
    pub priority: i32,

    /// Whether the offer is switched on
    pub active: bool,

    /// Start of the validity window
    #[serde(default)]
    pub starts_at: Option<Timestamp>,

    /// End of the validity window (exclusive)
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

impl CartOffer {
    /// Whether the offer is switched on and inside its validity window.
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.active
            && self.starts_at.is_none_or(|starts_at| starts_at <= now)
            && self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

/// Offer lifecycle on a cart. `Resolved` is never stored: it is the value
/// returned by [`resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OfferState {
    /// No offer accepted
    #[default]
    NoOffer,

    /// Offer accepted and applied while it keeps matching
    Accepted {
        /// Accepted offer
        offer: OfferUuid,
        /// Placement it was accepted from
        placement: Placement,
        /// Product being viewed when accepted from a product page
        viewing: Option<ProductUuid>,
    },

    /// Offer stopped matching the cart
    Expired {
        /// Expired offer
        offer: OfferUuid,
    },

    /// Offer was carried into an order
    Consumed {
        /// Consumed offer
        offer: OfferUuid,
    },
}

impl OfferState {
    /// The accepted offer, if any.
    pub fn accepted(&self) -> Option<OfferUuid> {
        match self {
            Self::Accepted { offer, .. } => Some(*offer),
            _ => None,
        }
    }
}

/// Offer resolution and acceptance failures.
#[derive(Debug, Error, PartialEq)]
pub enum OfferError {
    /// Offer no longer matches the current cart.
    #[error("offer {0} is no longer eligible for this cart")]
    NoLongerEligible(OfferUuid),

    /// Discount arithmetic failed.
    #[error(transparent)]
    Amount(#[from] AmountError),
}
