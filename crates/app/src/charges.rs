//! Shipping and tax charges

use decimal_percentage::Percentage;
use trolley::{
    money::percent_of_minor_floor,
    pricing::{Charges, ChargesError, ChargesSource, DraftTotals},
};

/// Flat shipping (waived above an optional threshold) plus a precomputed tax
/// rate applied to the discounted subtotal.
#[derive(Debug, Clone)]
pub struct ConfiguredCharges {
    currency: String,
    shipping_flat: i64,
    free_shipping_threshold: Option<i64>,
    tax_rate: Percentage,
}

impl ConfiguredCharges {
    #[must_use]
    pub fn new(
        currency: impl Into<String>,
        shipping_flat: i64,
        free_shipping_threshold: Option<i64>,
        tax_rate: Percentage,
    ) -> Self {
        Self {
            currency: currency.into(),
            shipping_flat,
            free_shipping_threshold,
            tax_rate,
        }
    }
}

impl ChargesSource for ConfiguredCharges {
    fn charges(&self, draft: &DraftTotals) -> Result<Charges, ChargesError> {
        if draft.currency != self.currency {
            return Err(ChargesError::UnsupportedCurrency(draft.currency.clone()));
        }

        let discounted = draft.discounted_subtotal();

        let free = draft.subtotal == 0
            || self
                .free_shipping_threshold
                .is_some_and(|threshold| discounted >= threshold);

        let shipping = if free { 0 } else { self.shipping_flat };
        let tax = percent_of_minor_floor(&self.tax_rate, discounted)?;

        Ok(Charges { shipping, tax })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn draft(subtotal: i64, discount_total: i64) -> DraftTotals {
        DraftTotals {
            currency: "GBP".to_string(),
            subtotal,
            discount_total,
        }
    }

    fn charges() -> ConfiguredCharges {
        ConfiguredCharges::new("GBP", 395, Some(5_000), Percentage::from(0.2))
    }

    #[test]
    fn shipping_is_charged_below_the_threshold() -> TestResult {
        let charges = charges().charges(&draft(2_000, 0))?;

        assert_eq!(charges.shipping, 395);
        assert_eq!(charges.tax, 400);

        Ok(())
    }

    #[test]
    fn threshold_applies_after_discounts() -> TestResult {
        let charges = charges().charges(&draft(5_500, 1_000))?;

        assert_eq!(charges.shipping, 395);
        assert_eq!(charges.tax, 900);

        Ok(())
    }

    #[test]
    fn shipping_is_waived_at_the_threshold() -> TestResult {
        let charges = charges().charges(&draft(5_000, 0))?;

        assert_eq!(charges.shipping, 0);

        Ok(())
    }

    #[test]
    fn empty_carts_are_not_charged() -> TestResult {
        assert_eq!(charges().charges(&draft(0, 0))?, Charges::default());

        Ok(())
    }

    #[test]
    fn tax_rounds_down() -> TestResult {
        let charges = charges().charges(&draft(1_999, 0))?;

        assert_eq!(charges.tax, 399);

        Ok(())
    }

    #[test]
    fn other_currencies_are_rejected() {
        let mut draft = draft(1_000, 0);
        draft.currency = "EUR".to_string();

        assert_eq!(
            charges().charges(&draft),
            Err(ChargesError::UnsupportedCurrency("EUR".to_string()))
        );
    }
}
