//! Fixture-backed catalog

use async_trait::async_trait;
use trolley::{
    catalog::{CatalogSnapshot, SnapshotKey},
    fixtures::Fixture,
};

use super::{CatalogError, CatalogReader};

/// Catalog answering from a fixed set of snapshots.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    snapshots: CatalogSnapshot,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(snapshots: CatalogSnapshot) -> Self {
        Self { snapshots }
    }

    #[must_use]
    pub fn from_fixture(fixture: &Fixture) -> Self {
        Self::new(fixture.catalog())
    }
}

#[async_trait]
impl CatalogReader for StaticCatalog {
    async fn snapshots(&self, keys: &[SnapshotKey]) -> Result<CatalogSnapshot, CatalogError> {
        Ok(keys
            .iter()
            .filter_map(|key| self.snapshots.get(key))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use trolley::catalog::ProductUuid;

    use super::*;

    const PRODUCTS: &str = r#"
products:
  kettle:
    name: Kettle
    price: "50.00 GBP"
  mug:
    name: Mug
    price: "8.50 GBP"
"#;

    #[tokio::test]
    async fn only_requested_keys_are_returned() -> TestResult {
        let mut fixture = Fixture::new();
        fixture.load_products_str(PRODUCTS)?;

        let catalog = StaticCatalog::from_fixture(&fixture);
        let kettle = fixture.product("kettle")?.key();
        let unknown = SnapshotKey {
            product: ProductUuid::new(),
            variant: None,
        };

        let snapshots = catalog.snapshots(&[kettle, unknown]).await?;

        assert_eq!(snapshots.len(), 1);
        assert!(snapshots.get(&kettle).is_some(), "kettle should be returned");
        assert!(snapshots.get(&unknown).is_none(), "unknown key should be absent");

        Ok(())
    }
}
