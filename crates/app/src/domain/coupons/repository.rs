//! Coupon Repositories

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use sqlx::{Postgres, query, query_scalar, types::Json};
use trolley::{
    coupons::{Coupon, normalize_code},
    fixtures::Fixture,
};

use crate::database::{Db, StoreError};

use super::CouponsRepository;

const FIND_COUPON_SQL: &str = include_str!("sql/find_coupon.sql");
const UPSERT_COUPON_SQL: &str = include_str!("sql/upsert_coupon.sql");

#[derive(Debug, Clone)]
pub struct PgCouponsRepository {
    db: Db,
}

impl PgCouponsRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert or replace a coupon definition.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn upsert_coupon(&self, coupon: &Coupon) -> Result<(), StoreError> {
        query(UPSERT_COUPON_SQL)
            .bind(normalize_code(&coupon.code))
            .bind(Json(coupon))
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

#[async_trait]
impl CouponsRepository for PgCouponsRepository {
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, StoreError> {
        let coupon = query_scalar::<Postgres, Json<Coupon>>(FIND_COUPON_SQL)
            .bind(code)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(coupon.map(|Json(coupon)| coupon))
    }
}

/// Coupons held in memory, keyed by normalised code.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCouponsRepository {
    coupons: FxHashMap<String, Coupon>,
}

impl InMemoryCouponsRepository {
    #[must_use]
    pub fn new(coupons: impl IntoIterator<Item = Coupon>) -> Self {
        Self {
            coupons: coupons
                .into_iter()
                .map(|coupon| (normalize_code(&coupon.code), coupon))
                .collect(),
        }
    }

    #[must_use]
    pub fn from_fixture(fixture: &Fixture) -> Self {
        Self::new(fixture.coupons().cloned())
    }
}

#[async_trait]
impl CouponsRepository for InMemoryCouponsRepository {
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, StoreError> {
        Ok(self.coupons.get(&normalize_code(code)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    const COUPONS: &str = r#"
coupons:
  SAVE10:
    discount:
      type: percentage
      value: "10%"
"#;

    #[tokio::test]
    async fn lookups_ignore_case_and_whitespace() -> TestResult {
        let mut fixture = Fixture::new();
        fixture.load_coupons_str(COUPONS)?;

        let coupons = InMemoryCouponsRepository::from_fixture(&fixture);

        let coupon = coupons.find_coupon(" save10 ").await?;

        assert_eq!(coupon.map(|coupon| coupon.code), Some("SAVE10".to_string()));
        assert_eq!(coupons.find_coupon("SAVE20").await?, None);

        Ok(())
    }
}
