//! Offer resolution and acceptance.

use jiff::Timestamp;
use serde::Serialize;
use smallvec::SmallVec;

use crate::{
    cart::Cart,
    catalog::ProductUuid,
    items::CartItem,
    money::{AmountError, find_currency, sum_minor},
    offers::{
        CartOffer, OfferDiscount, OfferError, OfferState, OfferTarget, OfferUuid, Placement,
        conditions::CartFacts,
        discounts::{self, LineDiscount, TargetLine},
    },
};

/// Where and when offers are being looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferContext {
    /// Storefront placement asking for an offer
    pub placement: Placement,

    /// Product being viewed, for product page placements
    pub viewing: Option<ProductUuid>,

    /// Evaluation time
    pub now: Timestamp,
}

/// The best offer for a cart at a placement, not yet accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedOffer {
    /// Offer id
    pub offer: OfferUuid,

    /// Display name
    pub name: String,

    /// Placement it was resolved for
    pub placement: Placement,

    /// Discount definition
    pub discount: OfferDiscount,

    /// Total discount the offer would give right now
    pub discount_total: i64,

    /// Per-line breakdown
    pub lines: SmallVec<[LineDiscount; 4]>,
}

/// Result of accepting an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acceptance {
    /// Newly accepted offer
    pub offer: OfferUuid,

    /// Previously accepted offer replaced by this one
    pub superseded: Option<OfferUuid>,
}

impl TargetLine {
    fn of(item: &CartItem) -> Result<Self, AmountError> {
        Ok(Self {
            item: item.uuid,
            quantity: item.quantity,
            subtotal: item.subtotal()?,
        })
    }
}

impl OfferTarget {
    fn selects(&self, item: &CartItem) -> bool {
        match self {
            Self::AllItems => true,
            Self::Products { products } => products.contains(&item.product),
            Self::Categories { categories } => categories
                .iter()
                .any(|category| item.in_category(*category)),
        }
    }
}

/// Evaluate one offer against a cart.
///
/// Returns the per-line discounts when the offer is live, matches the
/// placement, its condition holds and its target selects at least one line.
///
/// # Errors
///
/// Returns an error when line amounts overflow or the cart currency is
/// unknown.
pub fn evaluate(
    offer: &CartOffer,
    cart: &Cart,
    context: &OfferContext,
) -> Result<Option<SmallVec<[LineDiscount; 4]>>, AmountError> {
    if !offer.is_live(context.now) || offer.placement != context.placement {
        return Ok(None);
    }

    let currency = find_currency(&cart.currency)?;
    let subtotals = cart
        .items
        .iter()
        .map(CartItem::subtotal)
        .collect::<Result<Vec<_>, _>>()?;

    let facts = CartFacts {
        cart,
        subtotal: sum_minor(currency, subtotals)?,
        viewing: context.viewing,
    };

    if !offer.condition.holds(&facts) {
        return Ok(None);
    }

    let lines = cart
        .items
        .iter()
        .filter(|item| offer.target.selects(item))
        .map(TargetLine::of)
        .collect::<Result<Vec<_>, _>>()?;

    if lines.is_empty() {
        return Ok(None);
    }

    discounts::allocate(&offer.discount, &lines).map(Some)
}

/// Find the single best offer for a cart at a placement. Higher priority
/// wins; ties go to the lower offer id. The cart is not modified.
///
/// # Errors
///
/// Returns an error when discount arithmetic fails.
pub fn resolve(
    offers: &[CartOffer],
    cart: &Cart,
    context: &OfferContext,
) -> Result<Option<ResolvedOffer>, OfferError> {
    let mut ranked: Vec<&CartOffer> = offers.iter().collect();

    ranked.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.uuid.cmp(&b.uuid)));

    for offer in ranked {
        let Some(lines) = evaluate(offer, cart, context)? else {
            continue;
        };

        return Ok(Some(ResolvedOffer {
            offer: offer.uuid,
            name: offer.name.clone(),
            placement: context.placement,
            discount: offer.discount.clone(),
            discount_total: lines.iter().map(|line| line.amount).sum(),
            lines,
        }));
    }

    Ok(None)
}

/// Accept an offer for a cart, replacing any previously accepted one.
///
/// # Errors
///
/// Returns [`OfferError::NoLongerEligible`] when the offer does not match the
/// cart as it is now. The cart is left untouched in that case.
pub fn accept(
    cart: &mut Cart,
    offer: &CartOffer,
    context: &OfferContext,
) -> Result<Acceptance, OfferError> {
    if evaluate(offer, cart, context)?.is_none() {
        return Err(OfferError::NoLongerEligible(offer.uuid));
    }

    let superseded = cart.offer.accepted().filter(|previous| *previous != offer.uuid);

    cart.offer = OfferState::Accepted {
        offer: offer.uuid,
        placement: context.placement,
        viewing: context.viewing,
    };

    Ok(Acceptance {
        offer: offer.uuid,
        superseded,
    })
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::{
        cart::{CartOwner, SessionToken},
        catalog::ProductSnapshot,
        items::ItemOptions,
        offers::OfferCondition,
        units::{StockLevel, UnitRule},
    };

    use super::*;

    fn snapshot(unit_price: i64) -> ProductSnapshot {
        ProductSnapshot {
            product: ProductUuid::new(),
            variant: None,
            name: "Mug".to_string(),
            unit_price,
            currency: "GBP".to_string(),
            categories: Vec::new(),
            unit: UnitRule::pieces(),
            stock: StockLevel::untracked(),
            active: true,
        }
    }

    fn offer(name: &str, priority: i32, condition: OfferCondition) -> CartOffer {
        CartOffer {
            uuid: OfferUuid::new(),
            name: name.to_string(),
            placement: Placement::Cart,
            condition,
            target: OfferTarget::AllItems,
            discount: OfferDiscount::PercentageOff {
                rate: Percentage::from(0.10),
            },
            priority,
            active: true,
            starts_at: None,
            expires_at: None,
        }
    }

    fn context() -> OfferContext {
        OfferContext {
            placement: Placement::Cart,
            viewing: None,
            now: Timestamp::UNIX_EPOCH,
        }
    }

    fn cart_with(quantity: rust_decimal::Decimal) -> Result<Cart, crate::cart::CartError> {
        let mut cart = Cart::new(
            CartOwner::Session(SessionToken::new("s")),
            "GBP",
            Timestamp::UNIX_EPOCH,
        );

        cart.add_item(&snapshot(1_000), quantity, ItemOptions::new())?;

        Ok(cart)
    }

    #[test]
    fn highest_priority_offer_wins() -> TestResult {
        let cart = cart_with(dec!(2))?;
        let low = offer("Low", 1, OfferCondition::Always);
        let high = offer("High", 5, OfferCondition::Always);

        let resolved = resolve(&[low, high.clone()], &cart, &context())?;

        assert_eq!(resolved.map(|resolved| resolved.offer), Some(high.uuid));

        Ok(())
    }

    #[test]
    fn priority_ties_go_to_the_lower_id() -> TestResult {
        let cart = cart_with(dec!(1))?;
        let a = offer("A", 1, OfferCondition::Always);
        let b = offer("B", 1, OfferCondition::Always);
        let lower = a.uuid.min(b.uuid);

        let resolved = resolve(&[b, a], &cart, &context())?;

        assert_eq!(resolved.map(|resolved| resolved.offer), Some(lower));

        Ok(())
    }

    #[test]
    fn resolving_does_not_touch_the_cart() -> TestResult {
        let cart = cart_with(dec!(2))?;
        let before = cart.clone();

        let resolved = resolve(&[offer("Any", 0, OfferCondition::Always)], &cart, &context())?;

        assert_eq!(resolved.map(|resolved| resolved.discount_total), Some(200));
        assert_eq!(cart, before);

        Ok(())
    }

    #[test]
    fn placement_must_match() -> TestResult {
        let cart = cart_with(dec!(1))?;
        let checkout_only = CartOffer {
            placement: Placement::Checkout,
            ..offer("Checkout", 0, OfferCondition::Always)
        };

        assert_eq!(resolve(&[checkout_only], &cart, &context())?, None);

        Ok(())
    }

    #[test]
    fn accepting_supersedes_the_previous_offer() -> TestResult {
        let mut cart = cart_with(dec!(1))?;
        let first = offer("First", 0, OfferCondition::Always);
        let second = offer("Second", 0, OfferCondition::Always);

        accept(&mut cart, &first, &context())?;
        let acceptance = accept(&mut cart, &second, &context())?;

        assert_eq!(acceptance.superseded, Some(first.uuid));
        assert_eq!(cart.offer.accepted(), Some(second.uuid));

        Ok(())
    }

    #[test]
    fn accepting_an_unmatched_offer_is_rejected() -> TestResult {
        let mut cart = cart_with(dec!(2))?;
        let three_or_more = offer(
            "Three for less",
            0,
            OfferCondition::MinItemCount { count: dec!(3) },
        );
        let before = cart.clone();

        assert_eq!(
            accept(&mut cart, &three_or_more, &context()),
            Err(OfferError::NoLongerEligible(three_or_more.uuid))
        );
        assert_eq!(cart, before);

        Ok(())
    }
}
