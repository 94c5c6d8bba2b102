//! Coupon Fixtures

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    coupons::{Coupon, CouponDiscount, normalize_code},
    fixtures::{
        FixtureError,
        products::{parse_percentage, parse_price},
    },
};

/// Wrapper for coupons in YAML
#[derive(Debug, Deserialize)]
pub struct CouponsFixture {
    /// Map of coupon code -> coupon fixture
    pub coupons: FxHashMap<String, CouponFixture>,
}

/// Coupon discount from YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponDiscountFixture {
    /// Percentage of the subtotal (e.g., "10%")
    Percentage {
        /// Percentage string
        value: String,
    },

    /// Fixed amount off (e.g., "5.00 GBP")
    Fixed {
        /// Price string
        value: String,
    },
}

/// Coupon Fixture
#[derive(Debug, Deserialize)]
pub struct CouponFixture {
    /// Discount
    pub discount: CouponDiscountFixture,

    /// Minimum subtotal (e.g., "20.00 GBP")
    #[serde(default)]
    pub minimum: Option<String>,

    /// Discount cap (e.g., "15.00 GBP")
    #[serde(default)]
    pub maximum_discount: Option<String>,

    /// Allowed redemptions
    #[serde(default)]
    pub usage_limit: Option<u32>,

    /// Redemptions so far
    #[serde(default)]
    pub times_used: u32,

    /// Start of the validity window
    #[serde(default)]
    pub starts_at: Option<Timestamp>,

    /// End of the validity window
    #[serde(default)]
    pub expires_at: Option<Timestamp>,

    /// Combinable with cart offers
    #[serde(default = "default_true")]
    pub stackable: bool,

    /// Switched on
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl CouponFixture {
    /// Convert into a [`Coupon`] with the given code.
    ///
    /// # Errors
    ///
    /// Returns an error if a price or percentage cannot be parsed.
    pub fn try_into_coupon(self, code: &str) -> Result<Coupon, FixtureError> {
        let discount = match self.discount {
            CouponDiscountFixture::Percentage { value } => CouponDiscount::Percentage {
                rate: parse_percentage(&value)?,
            },
            CouponDiscountFixture::Fixed { value } => {
                let (amount, currency) = parse_price(&value)?;

                CouponDiscount::Fixed {
                    amount,
                    currency: currency.iso_alpha_code.to_string(),
                }
            }
        };

        let minor = |value: Option<String>| -> Result<Option<i64>, FixtureError> {
            value
                .map(|value| parse_price(&value).map(|(amount, _currency)| amount))
                .transpose()
        };

        Ok(Coupon {
            code: normalize_code(code),
            discount,
            minimum_subtotal: minor(self.minimum)?,
            maximum_discount: minor(self.maximum_discount)?,
            usage_limit: self.usage_limit,
            times_used: self.times_used,
            starts_at: self.starts_at,
            expires_at: self.expires_at,
            stackable: self.stackable,
            active: self.active,
        })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn coupon_fixture_parses_fixed_discounts() -> TestResult {
        let yaml = r#"
discount:
  type: fixed
  value: "5.00 GBP"
minimum: "20.00 GBP"
usage_limit: 10
stackable: false
"#;
        let fixture: CouponFixture = serde_norway::from_str(yaml)?;
        let coupon = fixture.try_into_coupon("fiver")?;

        assert_eq!(coupon.code, "FIVER");
        assert_eq!(
            coupon.discount,
            CouponDiscount::Fixed {
                amount: 500,
                currency: "GBP".to_string(),
            }
        );
        assert_eq!(coupon.minimum_subtotal, Some(2_000));
        assert_eq!(coupon.usage_limit, Some(10));
        assert!(!coupon.stackable);
        assert!(coupon.active);

        Ok(())
    }

    #[test]
    fn coupon_fixture_rejects_unknown_discount_type() {
        let yaml = r"
discount:
  type: buy_one_get_one
  value: 1
";
        let result: Result<CouponFixture, _> = serde_norway::from_str(yaml);

        assert!(result.is_err());
    }
}
