//! Coupons
//!
//! Coupons are owned by an external subsystem (including their usage count);
//! the engine only validates them against a cart subtotal and derives a
//! discount, every time the cart is priced.

use decimal_percentage::Percentage;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::{self, percentage_serde};

/// How a coupon discounts the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponDiscount {
    /// Fixed amount off the subtotal
    Fixed {
        /// Amount in minor units
        amount: i64,
        /// ISO currency code of `amount`
        currency: String,
    },

    /// Percentage of the subtotal, rounded down to the minor unit
    Percentage {
        /// Rate
        #[serde(with = "percentage_serde")]
        rate: Percentage,
    },
}

/// A discount coupon as read from the coupon store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Code, normalised with [`normalize_code`]
    pub code: String,

    /// Discount definition
    pub discount: CouponDiscount,

    /// Minimum subtotal the cart must reach
    #[serde(default)]
    pub minimum_subtotal: Option<i64>,

    /// Upper bound on the discount
    #[serde(default)]
    pub maximum_discount: Option<i64>,

    /// Number of redemptions allowed
    #[serde(default)]
    pub usage_limit: Option<u32>,

    /// Redemptions so far
    #[serde(default)]
    pub times_used: u32,

    /// Start of the validity window
    #[serde(default)]
    pub starts_at: Option<Timestamp>,

    /// End of the validity window (exclusive)
    #[serde(default)]
    pub expires_at: Option<Timestamp>,

    /// Whether the coupon may be combined with a cart offer
    #[serde(default = "default_true")]
    pub stackable: bool,

    /// Whether the coupon is switched on
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Reasons a coupon cannot be applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CouponError {
    /// No coupon has this code.
    #[error("coupon {0} does not exist")]
    NotFound(String),

    /// Coupon is switched off.
    #[error("coupon is not active")]
    Inactive,

    /// Validity window has not started.
    #[error("coupon is not valid until {starts_at}")]
    NotYetActive {
        /// Start of the window
        starts_at: Timestamp,
    },

    /// Validity window has ended.
    #[error("coupon expired at {expired_at}")]
    Expired {
        /// End of the window
        expired_at: Timestamp,
    },

    /// All redemptions have been used.
    #[error("coupon usage limit of {limit} reached")]
    UsageLimitReached {
        /// Allowed redemptions
        limit: u32,
    },

    /// Cart subtotal is below the coupon minimum.
    #[error("cart subtotal {subtotal} is below the coupon minimum of {minimum}")]
    MinimumNotMet {
        /// Coupon minimum
        minimum: i64,
        /// Cart subtotal
        subtotal: i64,
    },

    /// Coupon cannot be combined with the accepted cart offer.
    #[error("coupon cannot be combined with the accepted cart offer")]
    NotStackable,

    /// Fixed amount is in another currency than the cart.
    #[error("coupon is in {coupon}, cart is in {cart}")]
    CurrencyMismatch {
        /// Coupon currency
        coupon: String,
        /// Cart currency
        cart: String,
    },

    /// Discount could not be computed.
    #[error("coupon discount overflowed")]
    Overflow,
}

impl CouponError {
    /// Machine readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "coupon_not_found",
            Self::Inactive => "coupon_inactive",
            Self::NotYetActive { .. } => "coupon_not_yet_active",
            Self::Expired { .. } => "coupon_expired",
            Self::UsageLimitReached { .. } => "coupon_usage_limit_reached",
            Self::MinimumNotMet { .. } => "coupon_minimum_not_met",
            Self::NotStackable => "coupon_not_stackable",
            Self::CurrencyMismatch { .. } => "coupon_currency_mismatch",
            Self::Overflow => "coupon_overflow",
        }
    }
}

/// Normalise a user-entered code for lookup.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Coupon {
    /// Validate the coupon against a cart subtotal and return its discount in
    /// minor units, clamped to the subtotal.
    ///
    /// # Errors
    ///
    /// Returns the first [`CouponError`] that applies, checked in the order
    /// active, window start, window end, usage limit, currency, minimum.
    pub fn validate(&self, currency: &str, subtotal: i64, now: Timestamp) -> Result<i64, CouponError> {
        if !self.active {
            return Err(CouponError::Inactive);
        }

        if let Some(starts_at) = self.starts_at
            && now < starts_at
        {
            return Err(CouponError::NotYetActive { starts_at });
        }

        if let Some(expired_at) = self.expires_at
            && now >= expired_at
        {
            return Err(CouponError::Expired { expired_at });
        }

        if let Some(limit) = self.usage_limit
            && self.times_used >= limit
        {
            return Err(CouponError::UsageLimitReached { limit });
        }

        if let CouponDiscount::Fixed {
            currency: coupon_currency,
            ..
        } = &self.discount
            && coupon_currency != currency
        {
            return Err(CouponError::CurrencyMismatch {
                coupon: coupon_currency.clone(),
                cart: currency.to_string(),
            });
        }

        if let Some(minimum) = self.minimum_subtotal
            && subtotal < minimum
        {
            return Err(CouponError::MinimumNotMet { minimum, subtotal });
        }

        let discount = match &self.discount {
            CouponDiscount::Fixed { amount, .. } => *amount,
            CouponDiscount::Percentage { rate } => {
                money::percent_of_minor_floor(rate, subtotal).map_err(|_err| CouponError::Overflow)?
            }
        };

        let discount = match self.maximum_discount {
            Some(maximum) => discount.min(maximum),
            None => discount,
        };

        Ok(discount.clamp(0, subtotal.max(0)))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn percent_coupon(rate: f64) -> Coupon {
        Coupon {
            code: "SAVE".to_string(),
            discount: CouponDiscount::Percentage {
                rate: Percentage::from(rate),
            },
            minimum_subtotal: None,
            maximum_discount: None,
            usage_limit: None,
            times_used: 0,
            starts_at: None,
            expires_at: None,
            stackable: true,
            active: true,
        }
    }

    fn fixed_coupon(amount: i64) -> Coupon {
        Coupon {
            discount: CouponDiscount::Fixed {
                amount,
                currency: "GBP".to_string(),
            },
            ..percent_coupon(0.0)
        }
    }

    #[test]
    fn percentage_discount_rounds_down() -> TestResult {
        let coupon = percent_coupon(0.10);

        assert_eq!(coupon.validate("GBP", 10_000, Timestamp::now())?, 1_000);
        assert_eq!(coupon.validate("GBP", 999, Timestamp::now())?, 99);

        Ok(())
    }

    #[test]
    fn fixed_discount_is_clamped_to_subtotal() -> TestResult {
        let coupon = fixed_coupon(5_000);

        assert_eq!(coupon.validate("GBP", 1_250, Timestamp::now())?, 1_250);

        Ok(())
    }

    #[test]
    fn maximum_discount_caps_percentages() -> TestResult {
        let coupon = Coupon {
            maximum_discount: Some(500),
            ..percent_coupon(0.50)
        };

        assert_eq!(coupon.validate("GBP", 10_000, Timestamp::now())?, 500);

        Ok(())
    }

    #[test]
    fn expired_coupon_is_rejected() -> TestResult {
        let expired_at: Timestamp = "2020-01-01T00:00:00Z".parse()?;
        let coupon = Coupon {
            expires_at: Some(expired_at),
            ..percent_coupon(0.10)
        };

        assert_eq!(
            coupon.validate("GBP", 10_000, Timestamp::now()),
            Err(CouponError::Expired { expired_at })
        );

        Ok(())
    }

    #[test]
    fn coupon_not_yet_active_is_rejected() -> TestResult {
        let starts_at: Timestamp = "2030-01-01T00:00:00Z".parse()?;
        let now: Timestamp = "2029-12-31T23:59:59Z".parse()?;
        let coupon = Coupon {
            starts_at: Some(starts_at),
            ..percent_coupon(0.10)
        };

        assert_eq!(
            coupon.validate("GBP", 10_000, now),
            Err(CouponError::NotYetActive { starts_at })
        );

        Ok(())
    }

    #[test]
    fn usage_limit_is_enforced() {
        let coupon = Coupon {
            usage_limit: Some(5),
            times_used: 5,
            ..percent_coupon(0.10)
        };

        assert_eq!(
            coupon.validate("GBP", 10_000, Timestamp::now()),
            Err(CouponError::UsageLimitReached { limit: 5 })
        );
    }

    #[test]
    fn minimum_subtotal_is_enforced() {
        let coupon = Coupon {
            minimum_subtotal: Some(2_000),
            ..percent_coupon(0.10)
        };

        assert_eq!(
            coupon.validate("GBP", 1_999, Timestamp::now()),
            Err(CouponError::MinimumNotMet {
                minimum: 2_000,
                subtotal: 1_999,
            })
        );
    }

    #[test]
    fn inactive_is_checked_before_everything_else() -> TestResult {
        let coupon = Coupon {
            active: false,
            expires_at: Some("2020-01-01T00:00:00Z".parse()?),
            ..percent_coupon(0.10)
        };

        assert_eq!(
            coupon.validate("GBP", 10_000, Timestamp::now()),
            Err(CouponError::Inactive)
        );

        Ok(())
    }

    #[test]
    fn fixed_coupon_in_another_currency_is_rejected() {
        let coupon = fixed_coupon(500);

        assert!(matches!(
            coupon.validate("USD", 10_000, Timestamp::now()),
            Err(CouponError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn codes_are_normalised() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
    }

    #[test]
    fn percentage_rates_survive_storage_as_json() -> TestResult {
        let json = serde_json::to_value(percent_coupon(0.10))?;

        assert_eq!(json["discount"]["rate"], "0.1");

        let stored: Coupon = serde_json::from_value(json)?;

        assert_eq!(stored.validate("GBP", 10_000, Timestamp::UNIX_EPOCH)?, 1_000);

        Ok(())
    }
}
