//! Money helpers
//!
//! Amounts are carried as integer minor units of the cart currency. Quantities
//! are [`Decimal`], so multiplying the two is the only place rounding happens
//! outside of percentage discounts.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money, MoneyError,
    iso::{self, Currency},
};
use thiserror::Error;

/// Errors raised by minor-unit arithmetic.
#[derive(Debug, Error, PartialEq)]
pub enum AmountError {
    /// Currency code is not a known ISO-4217 code.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Result could not be represented in `i64` minor units.
    #[error("amount overflowed or could not be represented in minor units")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Look up an ISO currency by its alpha code.
///
/// # Errors
///
/// Returns [`AmountError::UnknownCurrency`] when the code is not recognised.
pub fn find_currency(code: &str) -> Result<&'static Currency, AmountError> {
    iso::find(code).ok_or_else(|| AmountError::UnknownCurrency(code.to_string()))
}

/// `quantity × unit_price`, rounded half away from zero to the minor unit.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] when the product does not fit.
pub fn line_amount(quantity: Decimal, unit_price: i64) -> Result<i64, AmountError> {
    Decimal::from(unit_price)
        .checked_mul(quantity)
        .ok_or(AmountError::Overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(AmountError::Overflow)
}

/// Percentage of a minor unit amount, rounded half away from zero.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] when the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, AmountError> {
    percent_with_strategy(percent, minor, RoundingStrategy::MidpointAwayFromZero)
}

/// Percentage of a minor unit amount, rounded down.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] when the calculation overflows.
pub fn percent_of_minor_floor(percent: &Percentage, minor: i64) -> Result<i64, AmountError> {
    percent_with_strategy(percent, minor, RoundingStrategy::ToNegativeInfinity)
}

fn percent_with_strategy(
    percent: &Percentage,
    minor: i64,
    strategy: RoundingStrategy,
) -> Result<i64, AmountError> {
    let minor = Decimal::from_i64(minor).ok_or(AmountError::Overflow)?;

    rate(percent)
        .checked_mul(minor)
        .ok_or(AmountError::Overflow)?
        .round_dp_with_strategy(0, strategy)
        .to_i64()
        .ok_or(AmountError::Overflow)
}

/// The fractional rate behind a [`Percentage`] (`10%` is `0.1`).
pub fn rate(percent: &Percentage) -> Decimal {
    // decimal_percentage doesn't expose the inner Decimal
    ((*percent) * Decimal::ONE).normalize()
}

/// Sum minor unit amounts in a single currency.
///
/// # Errors
///
/// Returns [`AmountError::Money`] when money arithmetic fails.
pub fn sum_minor<I>(currency: &Currency, amounts: I) -> Result<i64, AmountError>
where
    I: IntoIterator<Item = i64>,
{
    let total = amounts
        .into_iter()
        .try_fold(Money::from_minor(0, currency), |acc, amount| {
            acc.add(Money::from_minor(amount, currency))
        })?;

    Ok(total.to_minor_units())
}

/// Human readable rendering of a minor unit amount, e.g. `£12.50`.
pub fn format_minor(amount: i64, currency: &Currency) -> String {
    Money::from_minor(amount, currency).to_string()
}

/// Serde adapter storing a [`Percentage`] as its decimal rate.
pub mod percentage_serde {
    use decimal_percentage::Percentage;
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

    /// Serialize as the rate, e.g. `"0.1"` for 10%.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(percent: &Percentage, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&super::rate(percent), serializer)
    }

    /// Deserialize from a decimal rate.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is not a valid decimal.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Percentage, D::Error> {
        let rate = <Decimal as Deserialize>::deserialize(deserializer)?;

        Percentage::try_from(rate.to_string().as_str())
            .map_err(|_err| D::Error::custom(format!("invalid percentage rate: {rate}")))
    }
}
