//! Checkout Assembler
//!
//! Turns a priced cart into an order-creation request for the order
//! subsystem. Every line is validated again against fresh snapshots; stock
//! and coupon usage are left to the order subsystem.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, CartOwner, CartUuid, Totals},
    catalog::{CatalogSnapshot, ProductUuid, VariantUuid},
    items::{CartItemUuid, ItemOptions, OfferAttribution},
    offers::OfferUuid,
    units::{self, OutOfStock, QuantityError, ValidationError},
};

/// One order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Cart line it came from
    pub item: CartItemUuid,

    /// Product
    pub product: ProductUuid,

    /// Variant
    pub variant: Option<VariantUuid>,

    /// Product name at checkout
    pub name: String,

    /// Line options
    pub options: ItemOptions,

    /// Ordered quantity
    pub quantity: Decimal,

    /// Unit price in minor units
    pub unit_price: i64,

    /// Line discount in minor units
    pub line_discount: i64,

    /// Line total in minor units
    pub line_total: i64,

    /// Offer the line discount came from
    pub offer: Option<OfferAttribution>,
}

/// Order-creation request sent to the order subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Cart being checked out. Doubles as the idempotency key: the order
    /// subsystem creates at most one order per cart.
    pub cart: CartUuid,

    /// Cart owner
    pub owner: CartOwner,

    /// ISO currency code
    pub currency: String,

    /// Order lines
    pub lines: Vec<OrderLine>,

    /// Applied coupon code
    pub coupon: Option<String>,

    /// Accepted offer
    pub offer: Option<OfferUuid>,

    /// Totals at checkout
    pub totals: Totals,
}

/// Reasons a cart cannot be checked out.
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// A line's product can no longer be sold.
    #[error("product {product} on line {item} is unavailable")]
    ProductUnavailable {
        /// Offending line
        item: CartItemUuid,
        /// Its product
        product: ProductUuid,
    },

    /// A line's quantity no longer fits its unit rule.
    #[error("line {item} has an invalid quantity: {source}")]
    InvalidQuantity {
        /// Offending line
        item: CartItemUuid,
        /// Violation
        source: QuantityError,
    },

    /// A line is no longer covered by stock.
    #[error("line {item} is out of stock: {source}")]
    OutOfStock {
        /// Offending line
        item: CartItemUuid,
        /// Shortfall
        source: OutOfStock,
    },
}

/// Build an order request from a priced cart.
///
/// # Errors
///
/// Returns the first [`CheckoutError`] found, checking lines in cart order.
pub fn assemble_order(cart: &Cart, catalog: &CatalogSnapshot) -> Result<OrderRequest, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut lines = Vec::with_capacity(cart.items.len());

    for item in &cart.items {
        let snapshot = catalog
            .available(&item.key())
            .filter(|snapshot| snapshot.currency == cart.currency)
            .ok_or(CheckoutError::ProductUnavailable {
                item: item.uuid,
                product: item.product,
            })?;

        units::validate(&snapshot.unit, &snapshot.stock, item.quantity).map_err(|error| match error {
            ValidationError::Quantity(source) => CheckoutError::InvalidQuantity {
                item: item.uuid,
                source,
            },
            ValidationError::OutOfStock(source) => CheckoutError::OutOfStock {
                item: item.uuid,
                source,
            },
        })?;

        lines.push(OrderLine {
            item: item.uuid,
            product: item.product,
            variant: item.variant,
            name: item.name.clone(),
            options: item.options.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_discount: item.line_discount,
            line_total: item.line_total,
            offer: item.offer,
        });
    }

    Ok(OrderRequest {
        cart: cart.uuid,
        owner: cart.owner.clone(),
        currency: cart.currency.clone(),
        lines,
        coupon: cart.coupon.clone(),
        offer: cart.offer.accepted(),
        totals: cart.totals,
    })
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::{
        cart::SessionToken,
        catalog::ProductSnapshot,
        units::{StockLevel, UnitRule},
    };

    use super::*;

    fn snapshot(stock: StockLevel) -> ProductSnapshot {
        ProductSnapshot {
            product: ProductUuid::new(),
            variant: None,
            name: "Kettle".to_string(),
            unit_price: 2_500,
            currency: "GBP".to_string(),
            categories: Vec::new(),
            unit: UnitRule::pieces(),
            stock,
            active: true,
        }
    }

    fn cart() -> Cart {
        Cart::new(
            CartOwner::Session(SessionToken::new("s")),
            "GBP",
            Timestamp::UNIX_EPOCH,
        )
    }

    #[test]
    fn empty_cart_cannot_be_checked_out() {
        assert_eq!(
            assemble_order(&cart(), &CatalogSnapshot::new()),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn lines_are_carried_into_the_order() -> TestResult {
        let kettle = snapshot(StockLevel::tracked(dec!(5)));
        let catalog: CatalogSnapshot = [kettle.clone()].into_iter().collect();

        let mut cart = cart();
        let line = cart.add_item(&kettle, dec!(2), ItemOptions::new())?;
        cart.coupon = Some("SAVE".to_string());

        let order = assemble_order(&cart, &catalog)?;

        assert_eq!(order.cart, cart.uuid);
        assert_eq!(order.coupon.as_deref(), Some("SAVE"));
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines.first().map(|order_line| order_line.item), Some(line));

        Ok(())
    }

    #[test]
    fn stock_is_checked_again() -> TestResult {
        let kettle = snapshot(StockLevel::tracked(dec!(5)));

        let mut cart = cart();
        let line = cart.add_item(&kettle, dec!(4), ItemOptions::new())?;

        let sold_down = ProductSnapshot {
            stock: StockLevel::tracked(dec!(1)),
            ..kettle
        };
        let catalog: CatalogSnapshot = [sold_down].into_iter().collect();

        let result = assemble_order(&cart, &catalog);

        assert!(
            matches!(result, Err(CheckoutError::OutOfStock { item, .. }) if item == line),
            "expected OutOfStock, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn withdrawn_products_block_checkout() -> TestResult {
        let kettle = snapshot(StockLevel::untracked());

        let mut cart = cart();
        cart.add_item(&kettle, dec!(1), ItemOptions::new())?;

        let result = assemble_order(&cart, &CatalogSnapshot::new());

        assert!(
            matches!(result, Err(CheckoutError::ProductUnavailable { product, .. }) if product == kettle.product),
            "expected ProductUnavailable, got {result:?}"
        );

        Ok(())
    }
}
