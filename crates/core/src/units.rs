//! Quantity and stock validation
//!
//! Every orderable quantity must sit on the unit's stepping grid
//! (`min`, `min + step`, `min + 2·step`, ...) and be covered by available
//! stock unless the product may be backordered.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance used when checking decimal units against their step.
pub const DECIMAL_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// Unit stepping rule for a product or variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRule {
    /// Whether fractional quantities are allowed (e.g. kilograms).
    pub is_decimal: bool,

    /// Smallest orderable quantity.
    pub min: Decimal,

    /// Increment above `min`. Zero or negative disables the stepping check.
    pub step: Decimal,

    /// Largest orderable quantity, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,

    /// Display prefix, e.g. `"approx."`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Display suffix, e.g. `"kg"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl Default for UnitRule {
    fn default() -> Self {
        Self::pieces()
    }
}

impl UnitRule {
    /// Whole pieces, one at a time.
    pub fn pieces() -> Self {
        Self {
            is_decimal: false,
            min: Decimal::ONE,
            step: Decimal::ONE,
            max: None,
            prefix: None,
            suffix: None,
        }
    }

    /// Decimal unit with the given minimum and step.
    pub fn decimal(min: Decimal, step: Decimal) -> Self {
        Self {
            is_decimal: true,
            min,
            step,
            max: None,
            prefix: None,
            suffix: None,
        }
    }

    /// Check a quantity against this rule.
    ///
    /// # Errors
    ///
    /// Returns the first [`QuantityError`] the quantity violates.
    pub fn validate(&self, quantity: Decimal) -> Result<(), QuantityError> {
        if quantity <= Decimal::ZERO {
            return Err(QuantityError::NotPositive { quantity });
        }

        if !self.is_decimal && !quantity.fract().is_zero() {
            return Err(QuantityError::NotWhole { quantity });
        }

        if quantity < self.min {
            return Err(QuantityError::BelowMinimum {
                quantity,
                min: self.min,
            });
        }

        if let Some(max) = self.max
            && quantity > max
        {
            return Err(QuantityError::AboveMaximum { quantity, max });
        }

        if self.step > Decimal::ZERO && !self.on_step(quantity) {
            return Err(QuantityError::OffStep {
                quantity,
                min: self.min,
                step: self.step,
            });
        }

        Ok(())
    }

    /// Largest valid quantity not exceeding `limit`, if any.
    pub fn floor_to_step(&self, limit: Decimal) -> Option<Decimal> {
        let limit = match self.max {
            Some(max) if max < limit => max,
            _ => limit,
        };

        let limit = if self.is_decimal { limit } else { limit.floor() };

        if limit < self.min {
            return None;
        }

        let quantity = if self.step > Decimal::ZERO {
            let steps = limit
                .checked_sub(self.min)?
                .checked_div(self.step)?
                .floor();

            self.min.checked_add(steps.checked_mul(self.step)?)?
        } else {
            limit
        };

        self.validate(quantity).ok().map(|()| quantity)
    }

    fn on_step(&self, quantity: Decimal) -> bool {
        let Some(remainder) = quantity
            .checked_sub(self.min)
            .and_then(|offset| offset.checked_rem(self.step))
        else {
            return false;
        };

        if self.is_decimal {
            remainder.abs() <= DECIMAL_EPSILON || (self.step - remainder.abs()) <= DECIMAL_EPSILON
        } else {
            remainder.is_zero()
        }
    }
}

/// Quantity violations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative quantity.
    #[error("quantity {quantity} must be greater than zero")]
    NotPositive {
        /// Requested quantity
        quantity: Decimal,
    },

    /// Fractional quantity for a whole-unit product.
    #[error("quantity {quantity} must be a whole number")]
    NotWhole {
        /// Requested quantity
        quantity: Decimal,
    },

    /// Below the unit minimum.
    #[error("quantity {quantity} is below the minimum of {min}")]
    BelowMinimum {
        /// Requested quantity
        quantity: Decimal,
        /// Unit minimum
        min: Decimal,
    },

    /// Above the unit maximum.
    #[error("quantity {quantity} is above the maximum of {max}")]
    AboveMaximum {
        /// Requested quantity
        quantity: Decimal,
        /// Unit maximum
        max: Decimal,
    },

    /// Not on the stepping grid.
    #[error("quantity {quantity} must be {min} plus a multiple of {step}")]
    OffStep {
        /// Requested quantity
        quantity: Decimal,
        /// Unit minimum
        min: Decimal,
        /// Unit step
        step: Decimal,
    },
}

/// Stock state reported by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Units available to sell. `None` means stock is not tracked.
    #[serde(default)]
    pub available: Option<Decimal>,

    /// Whether the product may be sold beyond available stock.
    #[serde(default)]
    pub backorder_allowed: bool,
}

impl StockLevel {
    /// Untracked stock, always satisfiable.
    pub fn untracked() -> Self {
        Self::default()
    }

    /// Tracked stock without backorders.
    pub fn tracked(available: Decimal) -> Self {
        Self {
            available: Some(available),
            backorder_allowed: false,
        }
    }

    /// Check that `quantity` can be supplied.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfStock`] when stock is insufficient and backorders are disallowed.
    pub fn check(&self, quantity: Decimal) -> Result<(), OutOfStock> {
        match self.available {
            Some(available) if quantity > available && !self.backorder_allowed => {
                Err(OutOfStock {
                    requested: quantity,
                    available,
                })
            }
            _ => Ok(()),
        }
    }

    /// Cap a quantity to what stock allows, respecting the unit's stepping.
    ///
    /// Returns `None` when not even the unit minimum can be supplied.
    pub fn cap(&self, unit: &UnitRule, quantity: Decimal) -> Option<Decimal> {
        match self.available {
            Some(available) if quantity > available && !self.backorder_allowed => {
                unit.floor_to_step(available)
            }
            _ => Some(quantity),
        }
    }
}

/// Requested quantity exceeds available stock.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("requested {requested} but only {available} available")]
pub struct OutOfStock {
    /// Requested quantity
    pub requested: Decimal,

    /// Available quantity
    pub available: Decimal,
}

/// Combined quantity and stock failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Unit stepping violation
    #[error(transparent)]
    Quantity(#[from] QuantityError),

    /// Insufficient stock
    #[error(transparent)]
    OutOfStock(#[from] OutOfStock),
}

/// Run the unit check followed by the stock check.
///
/// # Errors
///
/// Returns the first failing check.
pub fn validate(unit: &UnitRule, stock: &StockLevel, quantity: Decimal) -> Result<(), ValidationError> {
    unit.validate(quantity)?;
    stock.check(quantity)?;

    Ok(())
}
