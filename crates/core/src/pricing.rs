//! Pricing Engine
//!
//! Recomputes a cart from its items, coupon and accepted offer in a fixed
//! order:
//!
//! 1. refresh lines from the catalog snapshot, dropping unsellable ones
//! 2. line subtotal = quantity × unit price
//! 3. subtotal = Σ line subtotals
//! 4. coupon discount, validated against the subtotal
//! 5. offer discount, attributed to the matched lines
//! 6. shipping and tax from a [`ChargesSource`]
//! 7. grand total = subtotal − discounts + shipping + tax, floored at zero
//!
//! Coupon and offer discounts are both computed against the pre-discount
//! subtotal and summed. Pricing the same inputs twice gives identical carts.

use std::fmt::Debug;

use jiff::Timestamp;
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, CartNotice, Totals},
    catalog::CatalogSnapshot,
    coupons::{Coupon, CouponError},
    items::OfferAttribution,
    money::{AmountError, find_currency, sum_minor},
    offers::{self, CartOffer, OfferContext, OfferState},
};

/// Totals handed to a [`ChargesSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftTotals {
    /// ISO currency code
    pub currency: String,

    /// Pre-discount subtotal
    pub subtotal: i64,

    /// Coupon plus offer discount
    pub discount_total: i64,
}

impl DraftTotals {
    /// Discounted subtotal, floored at zero.
    pub fn discounted_subtotal(&self) -> i64 {
        self.subtotal.saturating_sub(self.discount_total).max(0)
    }
}

/// Shipping and tax for a cart, in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charges {
    /// Shipping charge
    pub shipping: i64,

    /// Tax charge
    pub tax: i64,
}

/// Charges failures.
#[derive(Debug, Error, PartialEq)]
pub enum ChargesError {
    /// No charges are configured for the cart currency.
    #[error("no charges configured for currency {0}")]
    UnsupportedCurrency(String),

    /// Charge arithmetic failed.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// External shipping and tax input.
pub trait ChargesSource: Debug + Send + Sync {
    /// Charges for a cart with the given draft totals.
    ///
    /// # Errors
    ///
    /// Returns an error when charges cannot be determined.
    fn charges(&self, draft: &DraftTotals) -> Result<Charges, ChargesError>;
}

/// Charges source that never charges anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCharges;

impl ChargesSource for NoCharges {
    fn charges(&self, _draft: &DraftTotals) -> Result<Charges, ChargesError> {
        Ok(Charges::default())
    }
}

/// Everything pricing needs besides the cart itself.
#[derive(Debug, Clone, Copy)]
pub struct PricingInputs<'a> {
    /// Snapshots for the cart's lines
    pub catalog: &'a CatalogSnapshot,

    /// Coupon for the cart's coupon code, if it still exists
    pub coupon: Option<&'a Coupon>,

    /// Definition of the cart's accepted offer, if it still exists
    pub offer: Option<&'a CartOffer>,

    /// Shipping and tax
    pub charges: &'a dyn ChargesSource,

    /// Pricing time
    pub now: Timestamp,
}

/// Pricing failures. The cart is left untouched whenever one is returned.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Money arithmetic failed.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Charges could not be determined.
    #[error(transparent)]
    Charges(#[from] ChargesError),
}

/// Recompute a cart's lines and totals.
///
/// Returns a notice for every change pricing made on its own: dropped lines,
/// a detached coupon, an expired offer.
///
/// # Errors
///
/// Returns an error when arithmetic overflows, the cart currency is unknown,
/// or charges fail.
pub fn reprice(cart: &mut Cart, inputs: &PricingInputs<'_>) -> Result<Vec<CartNotice>, PricingError> {
    let mut draft = cart.clone();
    let notices = price(&mut draft, inputs)?;

    *cart = draft;

    Ok(notices)
}

fn price(cart: &mut Cart, inputs: &PricingInputs<'_>) -> Result<Vec<CartNotice>, PricingError> {
    let currency = find_currency(&cart.currency)?;
    let mut notices = refresh_lines(cart, inputs.catalog);

    for item in &mut cart.items {
        item.line_subtotal = item.subtotal()?;
    }

    let subtotal = sum_minor(currency, cart.items.iter().map(|item| item.line_subtotal))?;

    let mut coupon = apply_coupon(cart, inputs, subtotal, &mut notices)?;
    let offer_discount = apply_offer(cart, inputs, currency, &mut notices)?;

    if let Some((code, _discount, false)) = &coupon
        && offer_discount > 0
    {
        notices.push(CartNotice::CouponRemoved {
            code: code.clone(),
            reason: CouponError::NotStackable,
        });

        cart.coupon = None;
        coupon = None;
    }

    let coupon_discount = coupon.map_or(0, |(_code, discount, _stackable)| discount);
    let discount_total = sum_minor(currency, [coupon_discount, offer_discount])?;

    let charges = inputs.charges.charges(&DraftTotals {
        currency: cart.currency.clone(),
        subtotal,
        discount_total,
    })?;

    let grand_total = sum_minor(
        currency,
        [
            subtotal,
            discount_total.checked_neg().ok_or(AmountError::Overflow)?,
            charges.shipping,
            charges.tax,
        ],
    )?
    .max(0);

    for item in &mut cart.items {
        item.line_total = item
            .line_subtotal
            .checked_sub(item.line_discount)
            .ok_or(AmountError::Overflow)?
            .max(0);
    }

    cart.totals = Totals {
        subtotal,
        offer_discount,
        coupon_discount,
        discount_total,
        shipping_total: charges.shipping,
        tax_total: charges.tax,
        grand_total,
    };

    Ok(notices)
}

/// Re-capture catalog state for every line and drop the ones that can no
/// longer be sold.
fn refresh_lines(cart: &mut Cart, catalog: &CatalogSnapshot) -> Vec<CartNotice> {
    let mut notices = Vec::new();
    let items = std::mem::take(&mut cart.items);

    for mut item in items {
        let snapshot = catalog
            .available(&item.key())
            .filter(|snapshot| snapshot.currency == cart.currency);

        let Some(snapshot) = snapshot else {
            notices.push(CartNotice::ItemDropped {
                item: Some(item.uuid),
                product: item.product,
            });

            continue;
        };

        item.refresh(snapshot);
        item.clear_discount();

        cart.items.push(item);
    }

    notices
}

/// Validate the attached coupon. Returns `(code, discount, stackable)` when it
/// applies and detaches it otherwise.
fn apply_coupon(
    cart: &mut Cart,
    inputs: &PricingInputs<'_>,
    subtotal: i64,
    notices: &mut Vec<CartNotice>,
) -> Result<Option<(String, i64, bool)>, PricingError> {
    let Some(code) = cart.coupon.clone() else {
        return Ok(None);
    };

    let outcome = match inputs.coupon.filter(|coupon| coupon.code == code) {
        Some(coupon) => coupon
            .validate(&cart.currency, subtotal, inputs.now)
            .map(|discount| (discount, coupon.stackable)),
        None => Err(CouponError::NotFound(code.clone())),
    };

    match outcome {
        Ok((discount, stackable)) => Ok(Some((code, discount, stackable))),
        Err(CouponError::Overflow) => Err(AmountError::Overflow.into()),
        Err(reason) => {
            cart.coupon = None;
            notices.push(CartNotice::CouponRemoved { code, reason });

            Ok(None)
        }
    }
}

/// Re-evaluate the accepted offer and attribute its discount to the matched
/// lines. Expires the offer when it no longer matches.
fn apply_offer(
    cart: &mut Cart,
    inputs: &PricingInputs<'_>,
    currency: &Currency,
    notices: &mut Vec<CartNotice>,
) -> Result<i64, PricingError> {
    let OfferState::Accepted {
        offer,
        placement,
        viewing,
    } = cart.offer
    else {
        return Ok(0);
    };

    let context = OfferContext {
        placement,
        viewing,
        now: inputs.now,
    };

    let lines = match inputs.offer.filter(|definition| definition.uuid == offer) {
        Some(definition) => offers::evaluate(definition, cart, &context)?,
        None => None,
    };

    let Some(lines) = lines else {
        cart.offer = OfferState::Expired { offer };
        notices.push(CartNotice::OfferExpired { offer });

        return Ok(0);
    };

    for line in &lines {
        if let Some(item) = cart.items.iter_mut().find(|item| item.uuid == line.item) {
            item.line_discount = line.amount;
            item.offer = Some(OfferAttribution {
                offer,
                discount: line.amount,
            });
        }
    }

    Ok(sum_minor(currency, lines.iter().map(|line| line.amount))?)
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::{
        cart::{CartOwner, SessionToken},
        catalog::{ProductSnapshot, ProductUuid},
        coupons::CouponDiscount,
        items::ItemOptions,
        offers::{OfferCondition, OfferDiscount, OfferTarget, OfferUuid, Placement},
        units::{StockLevel, UnitRule},
    };

    use super::*;

    #[derive(Debug)]
    struct FlatCharges {
        shipping: i64,
        tax: i64,
    }

    impl ChargesSource for FlatCharges {
        fn charges(&self, _draft: &DraftTotals) -> Result<Charges, ChargesError> {
            Ok(Charges {
                shipping: self.shipping,
                tax: self.tax,
            })
        }
    }

    fn snapshot(unit_price: i64) -> ProductSnapshot {
        ProductSnapshot {
            product: ProductUuid::new(),
            variant: None,
            name: "Lamp".to_string(),
            unit_price,
            currency: "GBP".to_string(),
            categories: Vec::new(),
            unit: UnitRule::pieces(),
            stock: StockLevel::untracked(),
            active: true,
        }
    }

    fn coupon(discount: CouponDiscount) -> Coupon {
        Coupon {
            code: "SAVE".to_string(),
            discount,
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

    fn ten_percent() -> Coupon {
        coupon(CouponDiscount::Percentage {
            rate: Percentage::from(0.10),
        })
    }

    fn offer(condition: OfferCondition, discount: OfferDiscount) -> CartOffer {
        CartOffer {
            uuid: OfferUuid::new(),
            name: "Bundle".to_string(),
            placement: Placement::Cart,
            condition,
            target: OfferTarget::AllItems,
            discount,
            priority: 0,
            active: true,
            starts_at: None,
            expires_at: None,
        }
    }

    fn cart_with(snapshot: &ProductSnapshot, quantity: Decimal) -> Result<Cart, crate::cart::CartError> {
        let mut cart = Cart::new(
            CartOwner::Session(SessionToken::new("s")),
            "GBP",
            Timestamp::UNIX_EPOCH,
        );

        cart.add_item(snapshot, quantity, ItemOptions::new())?;

        Ok(cart)
    }

    fn accept(cart: &mut Cart, offer: &CartOffer) -> Result<(), offers::OfferError> {
        offers::accept(
            cart,
            offer,
            &OfferContext {
                placement: Placement::Cart,
                viewing: None,
                now: Timestamp::UNIX_EPOCH,
            },
        )
        .map(|_acceptance| ())
    }

    fn inputs<'a>(
        catalog: &'a CatalogSnapshot,
        coupon: Option<&'a Coupon>,
        offer: Option<&'a CartOffer>,
    ) -> PricingInputs<'a> {
        PricingInputs {
            catalog,
            coupon,
            offer,
            charges: &NoCharges,
            now: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn ten_percent_coupon_on_two_fifties() -> TestResult {
        let lamp = snapshot(5_000);
        let catalog: CatalogSnapshot = [lamp.clone()].into_iter().collect();
        let coupon = ten_percent();

        let mut cart = cart_with(&lamp, dec!(2))?;
        cart.coupon = Some("SAVE".to_string());

        let notices = reprice(&mut cart, &inputs(&catalog, Some(&coupon), None))?;

        assert!(notices.is_empty());
        assert_eq!(cart.totals.subtotal, 10_000);
        assert_eq!(cart.totals.coupon_discount, 1_000);
        assert_eq!(cart.totals.discount_total, 1_000);
        assert_eq!(cart.totals.grand_total, 9_000);

        Ok(())
    }

    #[test]
    fn repricing_is_idempotent() -> TestResult {
        let lamp = snapshot(1_999);
        let catalog: CatalogSnapshot = [lamp.clone()].into_iter().collect();
        let coupon = ten_percent();
        let bundle = offer(
            OfferCondition::Always,
            OfferDiscount::AmountOff { amount: 250 },
        );

        let mut cart = cart_with(&lamp, dec!(3))?;
        cart.coupon = Some("SAVE".to_string());
        accept(&mut cart, &bundle)?;

        let inputs = inputs(&catalog, Some(&coupon), Some(&bundle));

        reprice(&mut cart, &inputs)?;
        let first = serde_json::to_string(&cart)?;

        reprice(&mut cart, &inputs)?;
        let second = serde_json::to_string(&cart)?;

        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn coupon_and_offer_are_additive_not_nested() -> TestResult {
        let lamp = snapshot(5_000);
        let catalog: CatalogSnapshot = [lamp.clone()].into_iter().collect();
        let coupon = ten_percent();
        let bundle = offer(
            OfferCondition::Always,
            OfferDiscount::PercentageOff {
                rate: Percentage::from(0.20),
            },
        );

        let mut cart = cart_with(&lamp, dec!(2))?;
        cart.coupon = Some("SAVE".to_string());
        accept(&mut cart, &bundle)?;

        reprice(&mut cart, &inputs(&catalog, Some(&coupon), Some(&bundle)))?;

        assert_eq!(cart.totals.coupon_discount, 1_000);
        assert_eq!(cart.totals.offer_discount, 2_000);
        assert_eq!(cart.totals.discount_total, 3_000);
        assert_eq!(cart.totals.grand_total, 7_000);

        let line = cart.items.first().ok_or("missing line")?;

        assert_eq!(line.line_discount, 2_000);
        assert_eq!(line.line_total, 8_000);
        assert_eq!(
            line.offer,
            Some(OfferAttribution {
                offer: bundle.uuid,
                discount: 2_000,
            })
        );

        Ok(())
    }

    #[test]
    fn grand_total_never_goes_negative() -> TestResult {
        let lamp = snapshot(1_000);
        let catalog: CatalogSnapshot = [lamp.clone()].into_iter().collect();
        let coupon = coupon(CouponDiscount::Fixed {
            amount: 1_000,
            currency: "GBP".to_string(),
        });
        let bundle = offer(
            OfferCondition::Always,
            OfferDiscount::AmountOff { amount: 1_000 },
        );

        let mut cart = cart_with(&lamp, dec!(1))?;
        cart.coupon = Some("SAVE".to_string());
        accept(&mut cart, &bundle)?;

        reprice(&mut cart, &inputs(&catalog, Some(&coupon), Some(&bundle)))?;

        assert_eq!(cart.totals.discount_total, 2_000);
        assert_eq!(cart.totals.grand_total, 0);

        Ok(())
    }

    #[test]
    fn coupon_discount_is_clamped_to_subtotal() -> TestResult {
        let lamp = snapshot(300);
        let catalog: CatalogSnapshot = [lamp.clone()].into_iter().collect();
        let coupon = coupon(CouponDiscount::Fixed {
            amount: 5_000,
            currency: "GBP".to_string(),
        });

        let mut cart = cart_with(&lamp, dec!(1))?;
        cart.coupon = Some("SAVE".to_string());

        reprice(&mut cart, &inputs(&catalog, Some(&coupon), None))?;

        assert_eq!(cart.totals.coupon_discount, 300);
        assert_eq!(cart.totals.grand_total, 0);

        Ok(())
    }

    #[test]
    fn charges_are_added_after_discounts() -> TestResult {
        let lamp = snapshot(2_000);
        let catalog: CatalogSnapshot = [lamp.clone()].into_iter().collect();
        let coupon = ten_percent();

        let mut cart = cart_with(&lamp, dec!(1))?;
        cart.coupon = Some("SAVE".to_string());

        let charges = FlatCharges {
            shipping: 495,
            tax: 360,
        };

        reprice(
            &mut cart,
            &PricingInputs {
                charges: &charges,
                ..inputs(&catalog, Some(&coupon), None)
            },
        )?;

        assert_eq!(cart.totals.shipping_total, 495);
        assert_eq!(cart.totals.tax_total, 360);
        assert_eq!(cart.totals.grand_total, 2_000 - 200 + 495 + 360);

        Ok(())
    }

    #[test]
    fn invalid_coupon_is_detached_with_a_notice() -> TestResult {
        let lamp = snapshot(1_000);
        let catalog: CatalogSnapshot = [lamp.clone()].into_iter().collect();
        let expired_at: Timestamp = "1969-12-31T00:00:00Z".parse()?;
        let coupon = Coupon {
            expires_at: Some(expired_at),
            ..ten_percent()
        };

        let mut cart = cart_with(&lamp, dec!(1))?;
        cart.coupon = Some("SAVE".to_string());

        let notices = reprice(&mut cart, &inputs(&catalog, Some(&coupon), None))?;

        assert_eq!(cart.coupon, None);
        assert_eq!(cart.totals.coupon_discount, 0);
        assert_eq!(
            notices,
            vec![CartNotice::CouponRemoved {
                code: "SAVE".to_string(),
                reason: CouponError::Expired { expired_at },
            }]
        );

        Ok(())
    }

    #[test]
    fn missing_coupon_is_detached() -> TestResult {
        let lamp = snapshot(1_000);
        let catalog: CatalogSnapshot = [lamp.clone()].into_iter().collect();

        let mut cart = cart_with(&lamp, dec!(1))?;
        cart.coupon = Some("GONE".to_string());

        let notices = reprice(&mut cart, &inputs(&catalog, None, None))?;

        assert_eq!(cart.coupon, None);
        assert_eq!(notices.first().map(CartNotice::code), Some("coupon_removed"));

        Ok(())
    }

    #[test]
    fn offer_expires_when_the_cart_stops_matching() -> TestResult {
        let lamp = snapshot(1_000);
        let catalog: CatalogSnapshot = [lamp.clone()].into_iter().collect();
        let three_or_more = offer(
            OfferCondition::MinItemCount { count: dec!(3) },
            OfferDiscount::AmountOff { amount: 500 },
        );

        let mut cart = cart_with(&lamp, dec!(3))?;
        accept(&mut cart, &three_or_more)?;

        let line = cart.items.first().map(|item| item.uuid).ok_or("missing line")?;
        cart.update_item(line, dec!(2), Some(&lamp))?;

        let notices = reprice(&mut cart, &inputs(&catalog, None, Some(&three_or_more)))?;

        assert_eq!(
            cart.offer,
            OfferState::Expired {
                offer: three_or_more.uuid
            }
        );
        assert_eq!(cart.totals.offer_discount, 0);
        assert_eq!(
            notices,
            vec![CartNotice::OfferExpired {
                offer: three_or_more.uuid
            }]
        );

        Ok(())
    }

    #[test]
    fn non_stackable_coupon_gives_way_to_the_offer() -> TestResult {
        let lamp = snapshot(5_000);
        let catalog: CatalogSnapshot = [lamp.clone()].into_iter().collect();
        let coupon = Coupon {
            stackable: false,
            ..ten_percent()
        };
        let bundle = offer(
            OfferCondition::Always,
            OfferDiscount::AmountOff { amount: 500 },
        );

        let mut cart = cart_with(&lamp, dec!(1))?;
        cart.coupon = Some("SAVE".to_string());
        accept(&mut cart, &bundle)?;

        let notices = reprice(&mut cart, &inputs(&catalog, Some(&coupon), Some(&bundle)))?;

        assert_eq!(cart.coupon, None);
        assert_eq!(cart.totals.discount_total, 500);
        assert_eq!(
            notices,
            vec![CartNotice::CouponRemoved {
                code: "SAVE".to_string(),
                reason: CouponError::NotStackable,
            }]
        );

        Ok(())
    }

    #[test]
    fn unavailable_lines_are_dropped() -> TestResult {
        let lamp = snapshot(1_000);
        let mut cart = cart_with(&lamp, dec!(1))?;
        let line = cart.items.first().map(|item| item.uuid);

        let withdrawn = ProductSnapshot {
            active: false,
            ..lamp.clone()
        };
        let catalog: CatalogSnapshot = [withdrawn].into_iter().collect();

        let notices = reprice(&mut cart, &inputs(&catalog, None, None))?;

        assert!(cart.is_empty());
        assert_eq!(cart.totals, Totals::default());
        assert_eq!(
            notices,
            vec![CartNotice::ItemDropped {
                item: line,
                product: lamp.product,
            }]
        );

        Ok(())
    }

    #[test]
    fn prices_are_refreshed_from_the_catalog() -> TestResult {
        let lamp = snapshot(1_000);
        let mut cart = cart_with(&lamp, dec!(2))?;

        let on_sale = ProductSnapshot {
            unit_price: 800,
            ..lamp
        };
        let catalog: CatalogSnapshot = [on_sale].into_iter().collect();

        reprice(&mut cart, &inputs(&catalog, None, None))?;

        assert_eq!(cart.totals.subtotal, 1_600);

        Ok(())
    }

    #[test]
    fn unknown_currency_leaves_the_cart_untouched() -> TestResult {
        let lamp = snapshot(1_000);
        let catalog: CatalogSnapshot = [lamp.clone()].into_iter().collect();

        let mut cart = cart_with(&lamp, dec!(1))?;
        cart.currency = "ZZZ".to_string();

        let before = cart.clone();
        let result = reprice(&mut cart, &inputs(&catalog, None, None));

        assert_eq!(
            result,
            Err(PricingError::Amount(AmountError::UnknownCurrency(
                "ZZZ".to_string()
            )))
        );
        assert_eq!(cart, before);

        Ok(())
    }
}
