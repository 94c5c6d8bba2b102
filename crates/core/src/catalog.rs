//! Catalog snapshots
//!
//! The catalog itself lives elsewhere; the engine only consumes the
//! read-only snapshot of price, stock and unit rules captured before pricing.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    ids::TypedUuid,
    units::{StockLevel, UnitRule},
};

/// Catalog product marker.
#[derive(Debug)]
pub enum Product {}

/// Product variant marker.
#[derive(Debug)]
pub enum Variant {}

/// Product category marker.
#[derive(Debug)]
pub enum Category {}

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Variant UUID
pub type VariantUuid = TypedUuid<Variant>;

/// Category UUID
pub type CategoryUuid = TypedUuid<Category>;

/// Lookup key for a snapshot: a product and optionally one of its variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotKey {
    /// Product
    pub product: ProductUuid,

    /// Variant, when the product has variants
    #[serde(default)]
    pub variant: Option<VariantUuid>,
}

/// Price, stock and unit state of a product (or variant) at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product
    pub product: ProductUuid,

    /// Variant
    #[serde(default)]
    pub variant: Option<VariantUuid>,

    /// Display name
    pub name: String,

    /// Unit price in minor units, with any sale price already resolved
    pub unit_price: i64,

    /// ISO currency code of `unit_price`
    pub currency: String,

    /// Categories the product belongs to
    #[serde(default)]
    pub categories: Vec<CategoryUuid>,

    /// Unit stepping rule
    #[serde(default)]
    pub unit: UnitRule,

    /// Stock state
    #[serde(default)]
    pub stock: StockLevel,

    /// Whether the product can currently be sold
    pub active: bool,
}

impl ProductSnapshot {
    /// The key this snapshot answers for.
    pub fn key(&self) -> SnapshotKey {
        SnapshotKey {
            product: self.product,
            variant: self.variant,
        }
    }
}

/// A set of snapshots read together for one cart operation.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    snapshots: FxHashMap<SnapshotKey, ProductSnapshot>,
}

impl CatalogSnapshot {
    /// Empty snapshot set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a snapshot.
    pub fn insert(&mut self, snapshot: ProductSnapshot) {
        self.snapshots.insert(snapshot.key(), snapshot);
    }

    /// Snapshot for a product/variant pair.
    pub fn get(&self, key: &SnapshotKey) -> Option<&ProductSnapshot> {
        self.snapshots.get(key)
    }

    /// Snapshot for a key, but only if the product can be sold.
    pub fn available(&self, key: &SnapshotKey) -> Option<&ProductSnapshot> {
        self.get(key).filter(|snapshot| snapshot.active)
    }

    /// Number of snapshots held.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether no snapshots are held.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Iterate over held snapshots in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &ProductSnapshot> {
        self.snapshots.values()
    }
}

impl FromIterator<ProductSnapshot> for CatalogSnapshot {
    fn from_iter<I: IntoIterator<Item = ProductSnapshot>>(iter: I) -> Self {
        let mut catalog = Self::new();

        for snapshot in iter {
            catalog.insert(snapshot);
        }

        catalog
    }
}

impl Extend<ProductSnapshot> for CatalogSnapshot {
    fn extend<I: IntoIterator<Item = ProductSnapshot>>(&mut self, iter: I) {
        for snapshot in iter {
            self.insert(snapshot);
        }
    }
}
