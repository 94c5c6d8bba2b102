//! Carts service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rust_decimal::Decimal;
use tracing::{Span, info};
use trolley::{
    cart::{Cart, CartNotice, CartOwner, CustomerUuid, SessionToken},
    catalog::{CatalogSnapshot, ProductUuid, SnapshotKey},
    checkout::assemble_order,
    coupons::{CouponError, normalize_code},
    items::CartItemUuid,
    offers::{self, OfferContext, OfferState, OfferUuid, Placement, ResolvedOffer},
    pricing::{ChargesSource, PricingInputs, reprice},
};

use crate::domain::{
    carts::{
        errors::CartsServiceError,
        models::{AcceptedOffer, NewCartItem, PricedCart},
        stores::{CartStore, CartTransaction},
    },
    catalog::CatalogReader,
    coupons::CouponsRepository,
    offers::OffersRepository,
    orders::{OrderReceipt, OrdersGateway},
};

/// Everything the carts service reads from or writes to.
#[derive(Clone)]
pub struct CartsBackends {
    pub carts: Arc<dyn CartStore>,
    pub catalog: Arc<dyn CatalogReader>,
    pub coupons: Arc<dyn CouponsRepository>,
    pub offers: Arc<dyn OffersRepository>,
    pub orders: Arc<dyn OrdersGateway>,
    pub charges: Arc<dyn ChargesSource>,
}

/// Carts service over the pricing engine. Every operation is one
/// load-mutate-price-save cycle inside a store transaction.
#[derive(Clone)]
pub struct CartsEngine {
    backends: CartsBackends,
    currency: String,
}

impl CartsEngine {
    /// `currency` is used for carts created on first add.
    #[must_use]
    pub fn new(backends: CartsBackends, currency: impl Into<String>) -> Self {
        Self {
            backends,
            currency: currency.into(),
        }
    }

    async fn load(
        tx: &mut Box<dyn CartTransaction>,
        owner: &CartOwner,
    ) -> Result<Cart, CartsServiceError> {
        tx.load(owner).await?.ok_or(CartsServiceError::CartNotFound)
    }

    async fn read_catalog(&self, keys: &[SnapshotKey]) -> Result<CatalogSnapshot, CartsServiceError> {
        Ok(self.backends.catalog.snapshots(keys).await?)
    }

    async fn price(
        &self,
        cart: &mut Cart,
        catalog: &CatalogSnapshot,
        now: Timestamp,
    ) -> Result<Vec<CartNotice>, CartsServiceError> {
        let coupon = match cart.coupon.as_deref() {
            Some(code) => self.backends.coupons.find_coupon(code).await?,
            None => None,
        };

        let offer = match cart.offer.accepted() {
            Some(offer) => self.backends.offers.find_offer(offer).await?,
            None => None,
        };

        let notices = reprice(
            cart,
            &PricingInputs {
                catalog,
                coupon: coupon.as_ref(),
                offer: offer.as_ref(),
                charges: self.backends.charges.as_ref(),
                now,
            },
        )?;

        Ok(notices)
    }

    async fn store(
        mut tx: Box<dyn CartTransaction>,
        mut cart: Cart,
        notices: Vec<CartNotice>,
        now: Timestamp,
    ) -> Result<PricedCart, CartsServiceError> {
        cart.touch(now);

        tx.save(&cart).await?;
        tx.commit().await?;

        Span::current().record("cart", tracing::field::display(cart.uuid));

        Ok(PricedCart { cart, notices })
    }
}

#[async_trait]
impl CartsService for CartsEngine {
    #[tracing::instrument(
        name = "carts.service.get_cart",
        skip_all,
        fields(owner = %owner, cart = tracing::field::Empty),
        err
    )]
    async fn get_cart(&self, owner: &CartOwner) -> Result<PricedCart, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.backends.carts.begin().await?;

        let mut cart = Self::load(&mut tx, owner).await?;
        let before = cart.clone();

        let catalog = self.read_catalog(&cart.snapshot_keys()).await?;
        let notices = self.price(&mut cart, &catalog, now).await?;

        if cart == before {
            Span::current().record("cart", tracing::field::display(cart.uuid));

            return Ok(PricedCart { cart, notices });
        }

        info!(notices = notices.len(), "cart changed on read");

        Self::store(tx, cart, notices, now).await
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip_all,
        fields(owner = %owner, product = %item.product, cart = tracing::field::Empty),
        err
    )]
    async fn add_item(
        &self,
        owner: &CartOwner,
        item: NewCartItem,
    ) -> Result<PricedCart, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.backends.carts.begin().await?;

        let mut cart = tx
            .load(owner)
            .await?
            .unwrap_or_else(|| Cart::new(owner.clone(), self.currency.clone(), now));

        let key = item.key();
        let mut keys = cart.snapshot_keys();

        if !keys.contains(&key) {
            keys.push(key);
        }

        let catalog = self.read_catalog(&keys).await?;

        let snapshot = catalog
            .get(&key)
            .ok_or(CartsServiceError::ProductUnavailable(item.product))?;

        let line = cart.add_item(snapshot, item.quantity, item.options)?;
        let notices = self.price(&mut cart, &catalog, now).await?;

        info!(item = %line, quantity = %item.quantity, "added cart item");

        Self::store(tx, cart, notices, now).await
    }

    #[tracing::instrument(
        name = "carts.service.update_item",
        skip_all,
        fields(owner = %owner, item = %item, cart = tracing::field::Empty),
        err
    )]
    async fn update_item(
        &self,
        owner: &CartOwner,
        item: CartItemUuid,
        quantity: Decimal,
    ) -> Result<PricedCart, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.backends.carts.begin().await?;

        let mut cart = Self::load(&mut tx, owner).await?;

        let key = cart
            .item(item)
            .map(trolley::items::CartItem::key)
            .ok_or(CartsServiceError::CartItemNotFound(item))?;

        let catalog = self.read_catalog(&cart.snapshot_keys()).await?;

        cart.update_item(item, quantity, catalog.get(&key))?;

        let notices = self.price(&mut cart, &catalog, now).await?;

        info!(%quantity, "updated cart item");

        Self::store(tx, cart, notices, now).await
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip_all,
        fields(owner = %owner, item = %item, cart = tracing::field::Empty),
        err
    )]
    async fn remove_item(
        &self,
        owner: &CartOwner,
        item: CartItemUuid,
    ) -> Result<PricedCart, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.backends.carts.begin().await?;

        let mut cart = Self::load(&mut tx, owner).await?;

        let removed = cart.remove_item(item);

        let catalog = self.read_catalog(&cart.snapshot_keys()).await?;
        let notices = self.price(&mut cart, &catalog, now).await?;

        info!(removed, "removed cart item");

        Self::store(tx, cart, notices, now).await
    }

    #[tracing::instrument(
        name = "carts.service.clear_cart",
        skip_all,
        fields(owner = %owner, cart = tracing::field::Empty),
        err
    )]
    async fn clear_cart(&self, owner: &CartOwner) -> Result<PricedCart, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.backends.carts.begin().await?;

        let Some(mut cart) = tx.load(owner).await? else {
            // Nothing to clear; answer with an empty cart without creating one.
            let mut cart = Cart::new(owner.clone(), self.currency.clone(), now);
            let notices = self.price(&mut cart, &CatalogSnapshot::new(), now).await?;

            return Ok(PricedCart { cart, notices });
        };

        cart.clear();

        let notices = self.price(&mut cart, &CatalogSnapshot::new(), now).await?;

        info!("cleared cart");

        Self::store(tx, cart, notices, now).await
    }

    #[tracing::instrument(
        name = "carts.service.apply_coupon",
        skip_all,
        fields(owner = %owner, cart = tracing::field::Empty),
        err
    )]
    async fn apply_coupon(
        &self,
        owner: &CartOwner,
        code: &str,
    ) -> Result<PricedCart, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.backends.carts.begin().await?;

        let mut cart = Self::load(&mut tx, owner).await?;

        let catalog = self.read_catalog(&cart.snapshot_keys()).await?;
        let mut notices = self.price(&mut cart, &catalog, now).await?;

        let code = normalize_code(code);

        let coupon = self
            .backends
            .coupons
            .find_coupon(&code)
            .await?
            .ok_or_else(|| CouponError::NotFound(code.clone()))?;

        coupon.validate(&cart.currency, cart.totals.subtotal, now)?;

        if !coupon.stackable && cart.totals.offer_discount > 0 {
            return Err(CouponError::NotStackable.into());
        }

        cart.coupon = Some(code);

        notices.extend(self.price(&mut cart, &catalog, now).await?);

        info!(coupon = %coupon.code, "applied coupon");

        Self::store(tx, cart, notices, now).await
    }

    #[tracing::instrument(
        name = "carts.service.remove_coupon",
        skip_all,
        fields(owner = %owner, cart = tracing::field::Empty),
        err
    )]
    async fn remove_coupon(&self, owner: &CartOwner) -> Result<PricedCart, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.backends.carts.begin().await?;

        let mut cart = Self::load(&mut tx, owner).await?;

        let removed = cart.coupon.take();

        let catalog = self.read_catalog(&cart.snapshot_keys()).await?;
        let notices = self.price(&mut cart, &catalog, now).await?;

        info!(coupon = ?removed, "removed coupon");

        Self::store(tx, cart, notices, now).await
    }

    #[tracing::instrument(
        name = "carts.service.resolve_offer",
        skip_all,
        fields(owner = %owner, placement = %placement),
        err
    )]
    async fn resolve_offer(
        &self,
        owner: &CartOwner,
        placement: Placement,
        viewing: Option<ProductUuid>,
    ) -> Result<Option<ResolvedOffer>, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.backends.carts.begin().await?;

        let mut cart = tx
            .load(owner)
            .await?
            .unwrap_or_else(|| Cart::new(owner.clone(), self.currency.clone(), now));

        // Priced on a private copy; nothing is written back.
        let catalog = self.read_catalog(&cart.snapshot_keys()).await?;
        self.price(&mut cart, &catalog, now).await?;

        drop(tx);

        let candidates = self.backends.offers.active_offers(placement).await?;

        let resolved = offers::resolve(
            &candidates,
            &cart,
            &OfferContext {
                placement,
                viewing,
                now,
            },
        )?;

        Ok(resolved)
    }

    #[tracing::instrument(
        name = "carts.service.accept_offer",
        skip_all,
        fields(owner = %owner, offer = %offer, cart = tracing::field::Empty),
        err
    )]
    async fn accept_offer(
        &self,
        owner: &CartOwner,
        offer: OfferUuid,
        viewing: Option<ProductUuid>,
    ) -> Result<AcceptedOffer, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.backends.carts.begin().await?;

        let mut cart = Self::load(&mut tx, owner).await?;

        let definition = self
            .backends
            .offers
            .find_offer(offer)
            .await?
            .ok_or(CartsServiceError::OfferNotFound(offer))?;

        let catalog = self.read_catalog(&cart.snapshot_keys()).await?;
        let mut notices = self.price(&mut cart, &catalog, now).await?;

        let acceptance = offers::accept(
            &mut cart,
            &definition,
            &OfferContext {
                placement: definition.placement,
                viewing,
                now,
            },
        )?;

        notices.extend(self.price(&mut cart, &catalog, now).await?);

        info!(superseded = ?acceptance.superseded, "accepted offer");

        let priced = Self::store(tx, cart, notices, now).await?;

        Ok(AcceptedOffer {
            offer: acceptance.offer,
            superseded: acceptance.superseded,
            priced,
        })
    }

    #[tracing::instrument(
        name = "carts.service.merge_carts",
        skip_all,
        fields(session = %session, customer = %customer, cart = tracing::field::Empty),
        err
    )]
    async fn merge_carts(
        &self,
        session: SessionToken,
        customer: CustomerUuid,
    ) -> Result<PricedCart, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.backends.carts.begin().await?;

        let guest_owner = CartOwner::Session(session);
        let customer_owner = CartOwner::Customer(customer);

        let guest = tx.load(&guest_owner).await?;
        let existing = tx.load(&customer_owner).await?;

        let (mut cart, mut notices, catalog) = match (guest, existing) {
            (None, None) => return Err(CartsServiceError::CartNotFound),
            (None, Some(cart)) => {
                let catalog = self.read_catalog(&cart.snapshot_keys()).await?;

                (cart, Vec::new(), catalog)
            }
            (Some(mut guest), None) => {
                tx.delete(&guest_owner).await?;

                guest.owner = customer_owner;
                guest.offer = OfferState::NoOffer;

                let catalog = self.read_catalog(&guest.snapshot_keys()).await?;

                (guest, Vec::new(), catalog)
            }
            (Some(guest), Some(mut cart)) => {
                tx.delete(&guest_owner).await?;

                let mut keys = cart.snapshot_keys();

                for key in guest.snapshot_keys() {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }

                let catalog = self.read_catalog(&keys).await?;
                let notices = cart.absorb(guest, &catalog);

                (cart, notices, catalog)
            }
        };

        notices.extend(self.price(&mut cart, &catalog, now).await?);

        info!(notices = notices.len(), "merged guest cart");

        Self::store(tx, cart, notices, now).await
    }

    #[tracing::instrument(
        name = "carts.service.checkout",
        skip_all,
        fields(owner = %owner, cart = tracing::field::Empty),
        err
    )]
    async fn checkout(&self, owner: &CartOwner) -> Result<OrderReceipt, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.backends.carts.begin().await?;

        let mut cart = Self::load(&mut tx, owner).await?;

        Span::current().record("cart", tracing::field::display(cart.uuid));

        let catalog = self.read_catalog(&cart.snapshot_keys()).await?;
        let notices = self.price(&mut cart, &catalog, now).await?;

        if !notices.is_empty() {
            info!(notices = notices.len(), "cart changed before checkout");

            let priced = Self::store(tx, cart, notices, now).await?;

            return Err(CartsServiceError::CartChanged(priced.notices));
        }

        let order = assemble_order(&cart, &catalog)?;
        let receipt = self.backends.orders.submit(&order).await?;

        tx.delete(owner).await?;
        tx.commit().await?;

        info!(order = %receipt.order, offer = ?order.offer, grand_total = receipt.grand_total, "checked out cart");

        Ok(receipt)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Current cart, repriced against the catalog.
    async fn get_cart(&self, owner: &CartOwner) -> Result<PricedCart, CartsServiceError>;

    /// Add a product, creating the cart on first use.
    async fn add_item(
        &self,
        owner: &CartOwner,
        item: NewCartItem,
    ) -> Result<PricedCart, CartsServiceError>;

    /// Set a line's quantity; zero or less removes it.
    async fn update_item(
        &self,
        owner: &CartOwner,
        item: CartItemUuid,
        quantity: Decimal,
    ) -> Result<PricedCart, CartsServiceError>;

    /// Remove a line. Unknown lines are ignored.
    async fn remove_item(
        &self,
        owner: &CartOwner,
        item: CartItemUuid,
    ) -> Result<PricedCart, CartsServiceError>;

    /// Empty the cart. An owner without a cart gets an empty one back and
    /// nothing is stored.
    async fn clear_cart(&self, owner: &CartOwner) -> Result<PricedCart, CartsServiceError>;

    /// Attach a coupon, replacing any previous one.
    async fn apply_coupon(
        &self,
        owner: &CartOwner,
        code: &str,
    ) -> Result<PricedCart, CartsServiceError>;

    /// Detach the coupon.
    async fn remove_coupon(&self, owner: &CartOwner) -> Result<PricedCart, CartsServiceError>;

    /// Best offer for a placement, without changing the cart.
    async fn resolve_offer(
        &self,
        owner: &CartOwner,
        placement: Placement,
        viewing: Option<ProductUuid>,
    ) -> Result<Option<ResolvedOffer>, CartsServiceError>;

    /// Accept an offer if it still matches the cart.
    async fn accept_offer(
        &self,
        owner: &CartOwner,
        offer: OfferUuid,
        viewing: Option<ProductUuid>,
    ) -> Result<AcceptedOffer, CartsServiceError>;

    /// Fold a guest cart into the customer's cart on login.
    async fn merge_carts(
        &self,
        session: SessionToken,
        customer: CustomerUuid,
    ) -> Result<PricedCart, CartsServiceError>;

    /// Submit the cart as an order and discard it.
    async fn checkout(&self, owner: &CartOwner) -> Result<OrderReceipt, CartsServiceError>;
}
