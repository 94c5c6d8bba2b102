//! Cart aggregate
//!
//! A [`Cart`] owns its items, a reference to at most one coupon and the
//! lifecycle of at most one accepted cart offer. Cached [`Totals`] are only
//! ever written by [`crate::pricing::reprice`].

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    catalog::{CatalogSnapshot, ProductSnapshot, ProductUuid, SnapshotKey},
    coupons::CouponError,
    ids::TypedUuid,
    items::{CartItem, CartItemUuid, ItemOptions},
    offers::{OfferState, OfferUuid},
    units::{self, OutOfStock, QuantityError, ValidationError},
};

/// Cart UUID
pub type CartUuid = TypedUuid<Cart>;

/// Registered customer marker.
#[derive(Debug)]
pub enum Customer {}

/// Customer UUID
pub type CustomerUuid = TypedUuid<Customer>;

/// Opaque guest session token issued by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Who a cart belongs to. Exactly one of the two, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CartOwner {
    /// Anonymous visitor
    Session(SessionToken),

    /// Signed-in customer
    Customer(CustomerUuid),
}

impl CartOwner {
    /// Storage discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::Customer(_) => "customer",
        }
    }

    /// Storage key within [`Self::kind`].
    pub fn key(&self) -> String {
        match self {
            Self::Session(token) => token.to_string(),
            Self::Customer(uuid) => uuid.to_string(),
        }
    }
}

impl Display for CartOwner {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.kind(), self.key())
    }
}

/// Cached cart totals, all in minor units of the cart currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of line subtotals
    pub subtotal: i64,

    /// Offer discount folded into `discount_total`
    pub offer_discount: i64,

    /// Coupon discount folded into `discount_total`
    pub coupon_discount: i64,

    /// `coupon_discount + offer_discount`
    pub discount_total: i64,

    /// Shipping charge
    pub shipping_total: i64,

    /// Tax charge
    pub tax_total: i64,

    /// `subtotal − discount_total + shipping_total + tax_total`, floored at zero
    pub grand_total: i64,
}

/// Something the engine changed on its own while recomputing a cart.
#[derive(Debug, PartialEq, Error)]
pub enum CartNotice {
    /// The attached coupon no longer applies and was detached.
    #[error("coupon {code} was removed: {reason}")]
    CouponRemoved {
        /// Detached code
        code: String,
        /// Why it no longer applies
        reason: CouponError,
    },

    /// The accepted offer no longer matches the cart.
    #[error("offer {offer} no longer applies")]
    OfferExpired {
        /// Expired offer
        offer: OfferUuid,
    },

    /// A line was removed because its product can no longer be sold.
    #[error("product {product} is no longer available")]
    ItemDropped {
        /// Removed line
        item: Option<CartItemUuid>,
        /// Unavailable product
        product: ProductUuid,
    },

    /// A merged line was reduced to what stock allows.
    #[error("quantity of {item} reduced from {requested} to {granted}")]
    QuantityCapped {
        /// Affected line
        item: CartItemUuid,
        /// Quantity asked for
        requested: Decimal,
        /// Quantity kept
        granted: Decimal,
    },
}

impl CartNotice {
    /// Machine readable notice code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CouponRemoved { .. } => "coupon_removed",
            Self::OfferExpired { .. } => "offer_expired",
            Self::ItemDropped { .. } => "item_dropped",
            Self::QuantityCapped { .. } => "quantity_capped",
        }
    }
}

/// Cart mutation failures. The cart is left untouched whenever one is returned.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    /// Quantity is not valid for the product's unit.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(#[source] QuantityError),

    /// Not enough stock and backorders are disallowed.
    #[error("out of stock: {0}")]
    OutOfStock(#[source] OutOfStock),

    /// No line with this id.
    #[error("cart item {0} not found")]
    ItemNotFound(CartItemUuid),

    /// Product is unknown or inactive.
    #[error("product {0} is unavailable")]
    ProductUnavailable(ProductUuid),

    /// Product is priced in another currency than the cart.
    #[error("product is priced in {product}, cart is in {cart}")]
    CurrencyMismatch {
        /// Cart currency
        cart: String,
        /// Product currency
        product: String,
    },

    /// Quantity arithmetic overflowed.
    #[error("quantity overflowed")]
    Overflow,
}

impl From<ValidationError> for CartError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::Quantity(source) => Self::InvalidQuantity(source),
            ValidationError::OutOfStock(source) => Self::OutOfStock(source),
        }
    }
}

/// Cart aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart id
    pub uuid: CartUuid,

    /// Owning session or customer
    pub owner: CartOwner,

    /// ISO currency code all amounts are in
    pub currency: String,

    /// Lines in insertion order
    pub items: Vec<CartItem>,

    /// Attached coupon code, normalised
    pub coupon: Option<String>,

    /// Cart-offer lifecycle
    pub offer: OfferState,

    /// Cached totals
    pub totals: Totals,

    /// Creation time
    pub created_at: Timestamp,

    /// Last mutation time
    pub updated_at: Timestamp,
}

impl Cart {
    /// New empty cart.
    pub fn new(owner: CartOwner, currency: impl Into<String>, now: Timestamp) -> Self {
        Self {
            uuid: CartUuid::new(),
            owner,
            currency: currency.into(),
            items: Vec::new(),
            coupon: None,
            offer: OfferState::NoOffer,
            totals: Totals::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line by id.
    pub fn item(&self, uuid: CartItemUuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.uuid == uuid)
    }

    /// Distinct catalog keys referenced by the cart's lines.
    pub fn snapshot_keys(&self) -> Vec<SnapshotKey> {
        let mut keys = Vec::with_capacity(self.items.len());

        for item in &self.items {
            let key = item.key();

            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        keys
    }

    /// Item count as used by offer conditions.
    pub fn item_units(&self) -> Decimal {
        self.items.iter().map(CartItem::counted_units).sum()
    }

    /// Add `quantity` of a product, merging into an identical line if present.
    ///
    /// The merged quantity is what gets validated.
    ///
    /// # Errors
    ///
    /// Returns an error when the product cannot be sold, the quantity is off
    /// the unit's stepping grid, or stock is insufficient.
    pub fn add_item(
        &mut self,
        snapshot: &ProductSnapshot,
        quantity: Decimal,
        options: ItemOptions,
    ) -> Result<CartItemUuid, CartError> {
        self.ensure_sellable(snapshot)?;

        if quantity <= Decimal::ZERO {
            return Err(CartError::InvalidQuantity(QuantityError::NotPositive { quantity }));
        }

        let key = snapshot.key();

        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.is_same_line(&key, &options))
        else {
            units::validate(&snapshot.unit, &snapshot.stock, quantity)?;

            let item = CartItem::new(snapshot, quantity, options);
            let uuid = item.uuid;

            self.items.push(item);

            return Ok(uuid);
        };

        let merged = item
            .quantity
            .checked_add(quantity)
            .ok_or(CartError::Overflow)?;

        units::validate(&snapshot.unit, &snapshot.stock, merged)?;

        item.quantity = merged;
        item.refresh(snapshot);

        Ok(item.uuid)
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error when the line does not exist, the product cannot be
    /// sold, or the quantity fails validation.
    pub fn update_item(
        &mut self,
        uuid: CartItemUuid,
        quantity: Decimal,
        snapshot: Option<&ProductSnapshot>,
    ) -> Result<(), CartError> {
        let index = self
            .items
            .iter()
            .position(|item| item.uuid == uuid)
            .ok_or(CartError::ItemNotFound(uuid))?;

        if quantity <= Decimal::ZERO {
            self.items.remove(index);

            return Ok(());
        }

        let item = self.items.get_mut(index).ok_or(CartError::ItemNotFound(uuid))?;

        let snapshot = snapshot
            .filter(|snapshot| snapshot.active && snapshot.key() == item.key())
            .ok_or(CartError::ProductUnavailable(item.product))?;

        units::validate(&snapshot.unit, &snapshot.stock, quantity)?;

        item.quantity = quantity;
        item.refresh(snapshot);

        Ok(())
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove_item(&mut self, uuid: CartItemUuid) -> bool {
        let before = self.items.len();

        self.items.retain(|item| item.uuid != uuid);

        self.items.len() != before
    }

    /// Remove every line along with the coupon and any accepted offer.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon = None;
        self.offer = OfferState::NoOffer;
    }

    /// Fold a guest cart into this one.
    ///
    /// Lines merge by identity with quantities summed and capped to stock. A
    /// guest coupon is kept only when this cart has none. The guest's accepted
    /// offer is not carried over.
    pub fn absorb(&mut self, guest: Cart, catalog: &CatalogSnapshot) -> Vec<CartNotice> {
        let mut notices = Vec::new();

        for guest_item in guest.items {
            let key = guest_item.key();

            let Some(snapshot) = catalog
                .available(&key)
                .filter(|snapshot| snapshot.currency == self.currency)
            else {
                notices.push(CartNotice::ItemDropped {
                    item: Some(guest_item.uuid),
                    product: guest_item.product,
                });

                continue;
            };

            let existing = self
                .items
                .iter()
                .position(|item| item.is_same_line(&key, &guest_item.options));

            let current = existing
                .and_then(|index| self.items.get(index))
                .map_or(Decimal::ZERO, |item| item.quantity);

            let Some(requested) = current.checked_add(guest_item.quantity) else {
                notices.push(CartNotice::ItemDropped {
                    item: Some(guest_item.uuid),
                    product: guest_item.product,
                });

                continue;
            };

            let granted = snapshot
                .unit
                .floor_to_step(requested)
                .and_then(|quantity| snapshot.stock.cap(&snapshot.unit, quantity));

            if let Some(item) = existing.and_then(|index| self.items.get_mut(index)) {
                let granted = granted.unwrap_or(item.quantity);

                item.quantity = granted;
                item.refresh(snapshot);

                if granted < requested {
                    notices.push(CartNotice::QuantityCapped {
                        item: item.uuid,
                        requested,
                        granted,
                    });
                }

                continue;
            }

            let Some(granted) = granted else {
                notices.push(CartNotice::ItemDropped {
                    item: Some(guest_item.uuid),
                    product: guest_item.product,
                });

                continue;
            };

            let mut item = CartItem::new(snapshot, granted, guest_item.options);
            item.uuid = guest_item.uuid;

            if granted < requested {
                notices.push(CartNotice::QuantityCapped {
                    item: item.uuid,
                    requested,
                    granted,
                });
            }

            self.items.push(item);
        }

        if self.coupon.is_none() {
            self.coupon = guest.coupon;
        }

        notices
    }

    /// Mark the accepted offer as carried into an order.
    pub fn consume_offer(&mut self) -> Option<OfferUuid> {
        let offer = self.offer.accepted()?;

        self.offer = OfferState::Consumed { offer };

        Some(offer)
    }

    /// Record a mutation time.
    pub fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
    }

    fn ensure_sellable(&self, snapshot: &ProductSnapshot) -> Result<(), CartError> {
        if !snapshot.active {
            return Err(CartError::ProductUnavailable(snapshot.product));
        }

        if snapshot.currency != self.currency {
            return Err(CartError::CurrencyMismatch {
                cart: self.currency.clone(),
                product: snapshot.currency.clone(),
            });
        }

        Ok(())
    }
}
