//! Offer discount allocation across target lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    items::CartItemUuid,
    money::{AmountError, line_amount, percent_of_minor},
    offers::OfferDiscount,
};

/// Discount attributed to one cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDiscount {
    /// Discounted line
    pub item: CartItemUuid,

    /// Amount off, in minor units
    pub amount: i64,
}

/// A line selected by an offer target.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TargetLine {
    pub(crate) item: CartItemUuid,
    pub(crate) quantity: Decimal,
    pub(crate) subtotal: i64,
}

pub(crate) type Allocation = SmallVec<[LineDiscount; 4]>;

/// Split an offer discount over its target lines. Each line's discount is
/// clamped to the line subtotal.
pub(crate) fn allocate(
    discount: &OfferDiscount,
    lines: &[TargetLine],
) -> Result<Allocation, AmountError> {
    match discount {
        OfferDiscount::PercentageOff { rate } => lines
            .iter()
            .map(|line| {
                let amount = percent_of_minor(rate, line.subtotal)?;

                Ok(LineDiscount {
                    item: line.item,
                    amount: amount.clamp(0, line.subtotal),
                })
            })
            .collect(),
        OfferDiscount::AmountOverride { amount } => lines
            .iter()
            .map(|line| {
                let overridden = line_amount(line.quantity, *amount)?;

                Ok(LineDiscount {
                    item: line.item,
                    amount: line
                        .subtotal
                        .checked_sub(overridden)
                        .ok_or(AmountError::Overflow)?
                        .clamp(0, line.subtotal),
                })
            })
            .collect(),
        OfferDiscount::AmountOff { amount } => spread(*amount, lines),
    }
}

/// Spread a fixed amount proportionally to line subtotals. Shares are
/// rounded down and the remainder goes to the earliest lines with room.
fn spread(amount: i64, lines: &[TargetLine]) -> Result<Allocation, AmountError> {
    let total: i128 = lines.iter().map(|line| i128::from(line.subtotal)).sum();

    if total <= 0 || amount <= 0 {
        return Ok(lines
            .iter()
            .map(|line| LineDiscount {
                item: line.item,
                amount: 0,
            })
            .collect());
    }

    let amount = i128::from(amount).min(total);

    let mut allocation = lines
        .iter()
        .map(|line| {
            let share = amount * i128::from(line.subtotal) / total;

            Ok(LineDiscount {
                item: line.item,
                amount: i64::try_from(share).map_err(|_err| AmountError::Overflow)?,
            })
        })
        .collect::<Result<Allocation, AmountError>>()?;

    let allocated: i128 = allocation.iter().map(|line| i128::from(line.amount)).sum();
    let mut remainder = i64::try_from(amount - allocated).map_err(|_err| AmountError::Overflow)?;

    for (line, target) in allocation.iter_mut().zip(lines) {
        if remainder == 0 {
            break;
        }

        let room = target.subtotal - line.amount;
        let extra = room.min(remainder).max(0);

        line.amount += extra;
        remainder -= extra;
    }

    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    fn line(subtotal: i64, quantity: Decimal) -> TargetLine {
        TargetLine {
            item: CartItemUuid::new(),
            quantity,
            subtotal,
        }
    }

    fn amounts(allocation: &Allocation) -> Vec<i64> {
        allocation.iter().map(|line| line.amount).collect()
    }

    #[test]
    fn amount_off_is_spread_by_value_with_remainder_first() -> TestResult {
        let lines = [line(100, dec!(1)), line(100, dec!(1)), line(100, dec!(1))];

        let allocation = allocate(&OfferDiscount::AmountOff { amount: 100 }, &lines)?;

        assert_eq!(amounts(&allocation), vec![34, 33, 33]);

        Ok(())
    }

    #[test]
    fn amount_off_never_exceeds_target_value() -> TestResult {
        let lines = [line(300, dec!(1)), line(100, dec!(1))];

        let allocation = allocate(&OfferDiscount::AmountOff { amount: 1_000 }, &lines)?;

        assert_eq!(amounts(&allocation), vec![300, 100]);

        Ok(())
    }

    #[test]
    fn percentage_off_applies_per_line() -> TestResult {
        let lines = [line(1_000, dec!(2)), line(250, dec!(1))];

        let allocation = allocate(
            &OfferDiscount::PercentageOff {
                rate: Percentage::from(0.10),
            },
            &lines,
        )?;

        assert_eq!(amounts(&allocation), vec![100, 25]);

        Ok(())
    }

    #[test]
    fn override_discounts_down_to_the_new_unit_price() -> TestResult {
        // 3 units at 5.00 overridden to 4.00 each
        let lines = [line(1_500, dec!(3))];

        let allocation = allocate(&OfferDiscount::AmountOverride { amount: 400 }, &lines)?;

        assert_eq!(amounts(&allocation), vec![300]);

        Ok(())
    }

    #[test]
    fn override_above_price_is_not_a_surcharge() -> TestResult {
        let lines = [line(500, dec!(1))];

        let allocation = allocate(&OfferDiscount::AmountOverride { amount: 900 }, &lines)?;

        assert_eq!(amounts(&allocation), vec![0]);

        Ok(())
    }
}
