//! Cart Models

use rust_decimal::Decimal;
use trolley::{
    cart::{Cart, CartNotice},
    catalog::{ProductUuid, SnapshotKey, VariantUuid},
    items::ItemOptions,
    offers::OfferUuid,
};

/// A recomputed cart together with anything pricing changed on its own.
#[derive(Debug, PartialEq)]
pub struct PricedCart {
    pub cart: Cart,
    pub notices: Vec<CartNotice>,
}

/// NewCartItem Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub product: ProductUuid,
    pub variant: Option<VariantUuid>,
    pub quantity: Decimal,
    pub options: ItemOptions,
}

impl NewCartItem {
    #[must_use]
    pub fn key(&self) -> SnapshotKey {
        SnapshotKey {
            product: self.product,
            variant: self.variant,
        }
    }
}

/// Result of accepting a cart offer.
#[derive(Debug, PartialEq)]
pub struct AcceptedOffer {
    pub offer: OfferUuid,
    pub superseded: Option<OfferUuid>,
    pub priced: PricedCart,
}
