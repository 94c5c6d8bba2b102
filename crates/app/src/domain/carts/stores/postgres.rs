//! Postgres cart store
//!
//! One row per cart, the aggregate stored as `jsonb`. Loads take a row lock so
//! concurrent writers on the same cart queue behind each other.

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{Postgres, Transaction, query, query_scalar, types::Json};
use trolley::cart::{Cart, CartOwner};

use crate::database::{Db, StoreError};

use super::{CartStore, CartTransaction};

const LOAD_CART_SQL: &str = include_str!("../sql/load_cart.sql");
const SAVE_CART_SQL: &str = include_str!("../sql/save_cart.sql");
const DELETE_CART_SQL: &str = include_str!("../sql/delete_cart.sql");

#[derive(Debug, Clone)]
pub struct PgCartStore {
    db: Db,
}

impl PgCartStore {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn begin(&self) -> Result<Box<dyn CartTransaction>, StoreError> {
        let tx = self.db.begin().await?;

        Ok(Box::new(PgCartTransaction { tx }))
    }
}

struct PgCartTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CartTransaction for PgCartTransaction {
    async fn load(&mut self, owner: &CartOwner) -> Result<Option<Cart>, StoreError> {
        let cart = query_scalar::<Postgres, Json<Cart>>(LOAD_CART_SQL)
            .bind(owner.kind())
            .bind(owner.key())
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(cart.map(|Json(cart)| cart))
    }

    async fn save(&mut self, cart: &Cart) -> Result<(), StoreError> {
        query(SAVE_CART_SQL)
            .bind(cart.uuid.into_uuid())
            .bind(cart.owner.kind())
            .bind(cart.owner.key())
            .bind(Json(cart))
            .bind(SqlxTimestamp::from(cart.created_at))
            .bind(SqlxTimestamp::from(cart.updated_at))
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn delete(&mut self, owner: &CartOwner) -> Result<(), StoreError> {
        query(DELETE_CART_SQL)
            .bind(owner.kind())
            .bind(owner.key())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { tx } = *self;

        tx.commit().await?;

        Ok(())
    }
}
