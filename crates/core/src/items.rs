//! Cart Items

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::{CategoryUuid, ProductSnapshot, ProductUuid, SnapshotKey, VariantUuid},
    ids::TypedUuid,
    money::{AmountError, line_amount},
    offers::OfferUuid,
    units::UnitRule,
};

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItem>;

/// Free-form item options (engraving text, gift wrap, ...). Ordered so that
/// two option sets compare and serialize identically.
pub type ItemOptions = BTreeMap<String, String>;

/// Offer discount attributed to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferAttribution {
    /// Offer that produced the discount
    pub offer: OfferUuid,

    /// Discount taken off this line, in minor units
    pub discount: i64,
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Line id, unique within the cart
    pub uuid: CartItemUuid,

    /// Product
    pub product: ProductUuid,

    /// Variant
    pub variant: Option<VariantUuid>,

    /// Options that distinguish otherwise identical lines
    #[serde(default)]
    pub options: ItemOptions,

    /// Ordered quantity
    pub quantity: Decimal,

    /// Unit rule captured at pricing time
    pub unit: UnitRule,

    /// Product name captured at pricing time
    pub name: String,

    /// Product categories captured at pricing time
    #[serde(default)]
    pub categories: Vec<CategoryUuid>,

    /// Unit price in minor units captured at pricing time
    pub unit_price: i64,

    /// `quantity × unit_price`
    pub line_subtotal: i64,

    /// Offer discount applied to this line
    pub line_discount: i64,

    /// `line_subtotal − line_discount`
    pub line_total: i64,

    /// Offer the line discount came from
    pub offer: Option<OfferAttribution>,
}

impl CartItem {
    /// Create a line from a catalog snapshot. Totals are filled in by pricing.
    pub fn new(snapshot: &ProductSnapshot, quantity: Decimal, options: ItemOptions) -> Self {
        Self {
            uuid: CartItemUuid::new(),
            product: snapshot.product,
            variant: snapshot.variant,
            options,
            quantity,
            unit: snapshot.unit.clone(),
            name: snapshot.name.clone(),
            categories: snapshot.categories.clone(),
            unit_price: snapshot.unit_price,
            line_subtotal: 0,
            line_discount: 0,
            line_total: 0,
            offer: None,
        }
    }

    /// Catalog key for this line.
    pub fn key(&self) -> SnapshotKey {
        SnapshotKey {
            product: self.product,
            variant: self.variant,
        }
    }

    /// Whether this line has the given merge identity.
    pub fn is_same_line(&self, key: &SnapshotKey, options: &ItemOptions) -> bool {
        self.key() == *key && self.options == *options
    }

    /// Whether the line belongs to a category.
    pub fn in_category(&self, category: CategoryUuid) -> bool {
        self.categories.contains(&category)
    }

    /// `quantity × unit_price` at the currently captured price.
    ///
    /// # Errors
    ///
    /// Returns an error when the amount overflows.
    pub fn subtotal(&self) -> Result<i64, AmountError> {
        line_amount(self.quantity, self.unit_price)
    }

    /// Units this line contributes to item counts: its quantity for whole
    /// units, one for decimal units.
    pub fn counted_units(&self) -> Decimal {
        if self.unit.is_decimal {
            Decimal::ONE
        } else {
            self.quantity
        }
    }

    /// Refresh captured catalog state from a newer snapshot.
    pub(crate) fn refresh(&mut self, snapshot: &ProductSnapshot) {
        self.unit.clone_from(&snapshot.unit);
        self.name.clone_from(&snapshot.name);
        self.categories.clone_from(&snapshot.categories);
        self.unit_price = snapshot.unit_price;
    }

    /// Reset computed amounts ahead of repricing.
    pub(crate) fn clear_discount(&mut self) {
        self.line_discount = 0;
        self.offer = None;
    }
}
