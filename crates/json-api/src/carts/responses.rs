//! Cart response payloads
//!
//! Every mutating endpoint answers with the full recomputed cart so clients
//! can replace whatever they cached.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trolley::{
    cart::{Cart, CartNotice, Totals},
    items::CartItem,
    offers::{OfferState, ResolvedOffer},
};
use trolley_app::domain::{carts::models::PricedCart, orders::OrderReceipt};

/// Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    /// Cart UUID
    pub uuid: Uuid,

    /// ISO currency code every amount is in
    pub currency: String,

    /// Lines in insertion order
    pub items: Vec<CartItemResponse>,

    /// Attached coupon code
    pub coupon: Option<String>,

    /// Offer lifecycle
    pub offer: OfferStateResponse,

    /// Totals in minor units
    pub totals: TotalsResponse,

    /// Changes the engine made on its own while recomputing
    pub notices: Vec<NoticeResponse>,

    /// Last mutation time
    pub updated_at: String,
}

impl From<PricedCart> for CartResponse {
    fn from(priced: PricedCart) -> Self {
        let PricedCart { cart, notices } = priced;

        Self::with_notices(cart, &notices)
    }
}

impl CartResponse {
    pub(crate) fn with_notices(cart: Cart, notices: &[CartNotice]) -> Self {
        Self {
            uuid: cart.uuid.into_uuid(),
            currency: cart.currency,
            items: cart.items.into_iter().map(CartItemResponse::from).collect(),
            coupon: cart.coupon,
            offer: cart.offer.into(),
            totals: cart.totals.into(),
            notices: notices.iter().map(NoticeResponse::from).collect(),
            updated_at: cart.updated_at.to_string(),
        }
    }
}

/// Cart Item Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartItemResponse {
    /// Line UUID
    pub uuid: Uuid,

    /// Product UUID
    pub product_id: Uuid,

    /// Variant UUID
    pub product_variant_id: Option<Uuid>,

    /// Product name
    pub name: String,

    /// Ordered quantity
    #[salvo(schema(value_type = String))]
    pub quantity: Decimal,

    /// Line options
    pub options: BTreeMap<String, String>,

    /// Unit price
    pub unit_price: i64,

    /// `quantity × unit_price`
    pub line_subtotal: i64,

    /// Offer discount on this line
    pub line_discount: i64,

    /// `line_subtotal − line_discount`
    pub line_total: i64,

    /// Offer behind the line discount
    pub offer_id: Option<Uuid>,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        Self {
            uuid: item.uuid.into_uuid(),
            product_id: item.product.into_uuid(),
            product_variant_id: item.variant.map(|variant| variant.into_uuid()),
            name: item.name,
            quantity: item.quantity,
            options: item.options,
            unit_price: item.unit_price,
            line_subtotal: item.line_subtotal,
            line_discount: item.line_discount,
            line_total: item.line_total,
            offer_id: item.offer.map(|attribution| attribution.offer.into_uuid()),
        }
    }
}

/// Totals Response
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub(crate) struct TotalsResponse {
    pub subtotal: i64,
    pub offer_discount: i64,
    pub coupon_discount: i64,
    pub discount_total: i64,
    pub shipping_total: i64,
    pub tax_total: i64,
    pub grand_total: i64,
}

impl From<Totals> for TotalsResponse {
    fn from(totals: Totals) -> Self {
        Self {
            subtotal: totals.subtotal,
            offer_discount: totals.offer_discount,
            coupon_discount: totals.coupon_discount,
            discount_total: totals.discount_total,
            shipping_total: totals.shipping_total,
            tax_total: totals.tax_total,
            grand_total: totals.grand_total,
        }
    }
}

/// Offer State Response
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub(crate) struct OfferStateResponse {
    /// `no_offer`, `accepted`, `expired` or `consumed`
    pub state: String,

    /// Offer the state refers to
    pub offer_id: Option<Uuid>,
}

impl From<OfferState> for OfferStateResponse {
    fn from(state: OfferState) -> Self {
        let (state, offer) = match state {
            OfferState::NoOffer => ("no_offer", None),
            OfferState::Accepted { offer, .. } => ("accepted", Some(offer)),
            OfferState::Expired { offer } => ("expired", Some(offer)),
            OfferState::Consumed { offer } => ("consumed", Some(offer)),
        };

        Self {
            state: state.to_string(),
            offer_id: offer.map(|offer| offer.into_uuid()),
        }
    }
}

/// Notice Response
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub(crate) struct NoticeResponse {
    /// Machine readable code
    pub code: String,

    /// Human readable message
    pub message: String,
}

impl From<&CartNotice> for NoticeResponse {
    fn from(notice: &CartNotice) -> Self {
        Self {
            code: notice.code().to_string(),
            message: notice.to_string(),
        }
    }
}

/// Resolved Offer Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ResolvedOfferResponse {
    pub offer_id: Uuid,
    pub name: String,
    pub placement: String,

    /// Discount the offer would give right now
    pub discount_total: i64,

    pub lines: Vec<LineDiscountResponse>,
}

/// Line Discount Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct LineDiscountResponse {
    pub item_id: Uuid,
    pub amount: i64,
}

impl From<ResolvedOffer> for ResolvedOfferResponse {
    fn from(resolved: ResolvedOffer) -> Self {
        Self {
            offer_id: resolved.offer.into_uuid(),
            name: resolved.name,
            placement: resolved.placement.to_string(),
            discount_total: resolved.discount_total,
            lines: resolved
                .lines
                .into_iter()
                .map(|line| LineDiscountResponse {
                    item_id: line.item.into_uuid(),
                    amount: line.amount,
                })
                .collect(),
        }
    }
}

/// Order Receipt Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderReceiptResponse {
    pub order_id: Uuid,
    pub cart_id: Uuid,
    pub currency: String,
    pub grand_total: i64,
}

impl From<OrderReceipt> for OrderReceiptResponse {
    fn from(receipt: OrderReceipt) -> Self {
        Self {
            order_id: receipt.order,
            cart_id: receipt.cart.into_uuid(),
            currency: receipt.currency,
            grand_total: receipt.grand_total,
        }
    }
}
