//! In-memory cart store

use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use trolley::cart::{Cart, CartOwner};

use crate::database::StoreError;

use super::{CartStore, CartTransaction};

type Carts = FxHashMap<CartOwner, Cart>;

type OwnerLocks = FxHashMap<CartOwner, Arc<Mutex<()>>>;

/// Carts held in process memory.
///
/// A transaction locks each owner it touches until it is committed or
/// dropped, so writers on the same cart queue up while other carts proceed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<Carts>>,
    locks: Arc<Mutex<OwnerLocks>>,
}

impl InMemoryCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed cart for an owner.
    pub async fn get(&self, owner: &CartOwner) -> Option<Cart> {
        self.carts.read().await.get(owner).cloned()
    }

    pub async fn len(&self) -> usize {
        self.carts.read().await.len()
    }

    async fn lock_owner(&self, owner: &CartOwner) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(self.locks.lock().await.entry(owner.clone()).or_default());

        lock.lock_owned().await
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn begin(&self) -> Result<Box<dyn CartTransaction>, StoreError> {
        Ok(Box::new(InMemoryTransaction {
            store: self.clone(),
            held: FxHashMap::default(),
            staged: FxHashMap::default(),
        }))
    }
}

struct InMemoryTransaction {
    store: InMemoryCartStore,
    held: FxHashMap<CartOwner, OwnedMutexGuard<()>>,
    staged: FxHashMap<CartOwner, Option<Cart>>,
}

impl InMemoryTransaction {
    async fn lock(&mut self, owner: &CartOwner) {
        if !self.held.contains_key(owner) {
            let guard = self.store.lock_owner(owner).await;

            self.held.insert(owner.clone(), guard);
        }
    }
}

#[async_trait]
impl CartTransaction for InMemoryTransaction {
    async fn load(&mut self, owner: &CartOwner) -> Result<Option<Cart>, StoreError> {
        self.lock(owner).await;

        if let Some(staged) = self.staged.get(owner) {
            return Ok(staged.clone());
        }

        Ok(self.store.get(owner).await)
    }

    async fn save(&mut self, cart: &Cart) -> Result<(), StoreError> {
        self.lock(&cart.owner).await;
        self.staged.insert(cart.owner.clone(), Some(cart.clone()));

        Ok(())
    }

    async fn delete(&mut self, owner: &CartOwner) -> Result<(), StoreError> {
        self.lock(owner).await;
        self.staged.insert(owner.clone(), None);

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self {
            store,
            held,
            staged,
        } = *self;

        let mut carts = store.carts.write().await;

        for (owner, cart) in staged {
            match cart {
                Some(cart) => carts.insert(owner, cart),
                None => carts.remove(&owner),
            };
        }

        drop(carts);
        drop(held);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jiff::Timestamp;
    use testresult::TestResult;
    use tokio::time::timeout;
    use trolley::cart::SessionToken;

    use super::*;

    fn owner() -> CartOwner {
        CartOwner::Session(SessionToken::new("tab-1"))
    }

    fn other_owner() -> CartOwner {
        CartOwner::Session(SessionToken::new("tab-2"))
    }

    #[tokio::test]
    async fn committed_changes_are_visible() -> TestResult {
        let store = InMemoryCartStore::new();
        let cart = Cart::new(owner(), "GBP", Timestamp::UNIX_EPOCH);

        let mut tx = store.begin().await?;
        tx.save(&cart).await?;
        tx.commit().await?;

        assert_eq!(store.get(&owner()).await, Some(cart));

        Ok(())
    }

    #[tokio::test]
    async fn dropped_transactions_are_discarded() -> TestResult {
        let store = InMemoryCartStore::new();

        {
            let mut tx = store.begin().await?;
            tx.save(&Cart::new(owner(), "GBP", Timestamp::UNIX_EPOCH)).await?;
        }

        assert_eq!(store.len().await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn staged_deletes_hide_the_cart() -> TestResult {
        let store = InMemoryCartStore::new();

        let mut tx = store.begin().await?;
        tx.save(&Cart::new(owner(), "GBP", Timestamp::UNIX_EPOCH)).await?;
        tx.commit().await?;

        let mut tx = store.begin().await?;
        tx.delete(&owner()).await?;

        assert_eq!(tx.load(&owner()).await?, None);

        tx.commit().await?;

        assert_eq!(store.len().await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn transactions_on_other_carts_do_not_wait() -> TestResult {
        let store = InMemoryCartStore::new();

        let mut first = store.begin().await?;
        first.load(&owner()).await?;

        let second = async {
            let mut tx = store.begin().await?;
            tx.load(&other_owner()).await?;
            tx.save(&Cart::new(other_owner(), "GBP", Timestamp::UNIX_EPOCH))
                .await?;
            tx.commit().await
        };

        timeout(Duration::from_millis(500), second).await??;

        assert!(store.get(&other_owner()).await.is_some(), "second cart committed");

        first.commit().await?;

        Ok(())
    }

    #[tokio::test]
    async fn transactions_on_the_same_cart_queue_up() -> TestResult {
        let store = InMemoryCartStore::new();

        let mut first = store.begin().await?;
        first.load(&owner()).await?;

        let mut second = store.begin().await?;

        let blocked = timeout(Duration::from_millis(50), second.load(&owner())).await;

        assert!(blocked.is_err(), "expected the second load to wait");

        first.commit().await?;

        let loaded = timeout(Duration::from_millis(500), second.load(&owner())).await?;

        assert_eq!(loaded?, None);

        Ok(())
    }
}
