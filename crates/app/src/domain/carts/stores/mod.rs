//! Cart Stores
//!
//! Each service operation runs inside one store transaction: load, mutate,
//! save, commit. Dropping a transaction without committing discards it.

use async_trait::async_trait;
use trolley::cart::{Cart, CartOwner};

use crate::database::StoreError;

mod memory;
mod postgres;

pub use memory::InMemoryCartStore;
pub use postgres::PgCartStore;

#[async_trait]
pub trait CartStore: Send + Sync {
    /// Open a transaction.
    async fn begin(&self) -> Result<Box<dyn CartTransaction>, StoreError>;
}

#[async_trait]
pub trait CartTransaction: Send {
    /// Load and lock the owner's cart.
    async fn load(&mut self, owner: &CartOwner) -> Result<Option<Cart>, StoreError>;

    /// Insert or replace the cart stored for `cart.owner`.
    async fn save(&mut self, cart: &Cart) -> Result<(), StoreError>;

    /// Remove the owner's cart, if any.
    async fn delete(&mut self, owner: &CartOwner) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
