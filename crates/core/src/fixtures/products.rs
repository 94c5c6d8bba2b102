//! Product Fixtures

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use serde::Deserialize;
use uuid::Uuid;

use crate::{fixtures::FixtureError, money::find_currency, units::UnitRule};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Category key -> category id
    #[serde(default)]
    pub categories: FxHashMap<String, Uuid>,

    /// Map of product key -> product fixture
    pub products: FxHashMap<String, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Fixed product id; generated when omitted
    #[serde(default)]
    pub uuid: Option<Uuid>,

    /// Product name
    pub name: String,

    /// Product price (e.g., "2.99 GBP")
    pub price: String,

    /// Category keys
    #[serde(default)]
    pub categories: Vec<String>,

    /// Unit stepping; whole pieces when omitted
    #[serde(default)]
    pub unit: Option<UnitFixture>,

    /// Units in stock; untracked when omitted
    #[serde(default)]
    pub stock: Option<Decimal>,

    /// Whether the product may be backordered
    #[serde(default)]
    pub backorder: bool,

    /// Whether the product can be sold
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Unit stepping from YAML
#[derive(Debug, Deserialize)]
pub struct UnitFixture {
    /// Fractional quantities allowed
    #[serde(default)]
    pub decimal: bool,

    /// Smallest orderable quantity
    pub min: Decimal,

    /// Increment above `min`
    pub step: Decimal,

    /// Largest orderable quantity
    #[serde(default)]
    pub max: Option<Decimal>,

    /// Display prefix
    #[serde(default)]
    pub prefix: Option<String>,

    /// Display suffix
    #[serde(default)]
    pub suffix: Option<String>,
}

impl From<UnitFixture> for UnitRule {
    fn from(fixture: UnitFixture) -> Self {
        Self {
            is_decimal: fixture.decimal,
            min: fixture.min,
            step: fixture.step,
            max: fixture.max,
            prefix: fixture.prefix,
            suffix: fixture.suffix,
        }
    }
}

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a decimal with at most the currency's minor digits,
/// or if the currency code is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = find_currency(currency_code)
        .map_err(|_err| FixtureError::UnknownCurrency((*currency_code).to_string()))?;

    let scale = Decimal::from(10_i64.pow(currency.exponent));

    let minor = amount
        .checked_mul(scale)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    if !minor.fract().is_zero() {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    let minor_units = minor
        .round_dp_with_strategy(0, RoundingStrategy::ToZero)
        .to_i64()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// Accepts two formats:
/// - Percentage format: "15%" for 15%
/// - Decimal format: "0.15" for 15%
///
/// # Errors
///
/// Returns an error if the string cannot be parsed or if the value is invalid.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    let rate = match trimmed.strip_suffix('%') {
        Some(percent) => percent
            .trim()
            .parse::<Decimal>()
            .ok()
            .and_then(|value| value.checked_div(Decimal::ONE_HUNDRED)),
        None => trimmed.parse::<Decimal>().ok(),
    }
    .ok_or_else(|| FixtureError::InvalidPercentage(s.to_string()))?;

    if rate.is_sign_negative() {
        return Err(FixtureError::InvalidPercentage(s.to_string()));
    }

    Percentage::try_from(rate.normalize().to_string().as_str())
        .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{EUR, GBP, JPY, USD};

    use crate::money::rate;

    use super::*;

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("2.99GBP");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_price_uses_currency_exponent() -> Result<(), FixtureError> {
        let (usd_minor, usd) = parse_price("1.00 USD")?;
        let (eur_minor, eur) = parse_price("2.50 EUR")?;
        let (jpy_minor, jpy) = parse_price("500 JPY")?;

        assert_eq!((usd_minor, usd), (100, USD));
        assert_eq!((eur_minor, eur), (250, EUR));
        assert_eq!((jpy_minor, jpy), (500, JPY));

        Ok(())
    }

    #[test]
    fn parse_price_rejects_sub_minor_precision() {
        let result = parse_price("2.999 GBP");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_reads_gbp() -> Result<(), FixtureError> {
        assert_eq!(parse_price("50.00 GBP")?, (5_000, GBP));

        Ok(())
    }

    #[test]
    fn parse_percentage_accepts_both_formats() -> Result<(), FixtureError> {
        assert_eq!(rate(&parse_percentage("15%")?), Decimal::new(15, 2));
        assert_eq!(rate(&parse_percentage("0.15")?), Decimal::new(15, 2));
        assert_eq!(rate(&parse_percentage("  100% ")?), Decimal::ONE);

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_garbage_and_negatives() {
        assert!(matches!(
            parse_percentage("invalid"),
            Err(FixtureError::InvalidPercentage(_))
        ));
        assert!(matches!(
            parse_percentage("-5%"),
            Err(FixtureError::InvalidPercentage(_))
        ));
    }
}
