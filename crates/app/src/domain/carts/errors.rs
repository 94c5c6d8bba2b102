//! Carts service errors.

use thiserror::Error;
use trolley::{
    cart::{CartError, CartNotice},
    catalog::ProductUuid,
    checkout::CheckoutError,
    coupons::CouponError,
    items::CartItemUuid,
    offers::{OfferError, OfferUuid},
    pricing::PricingError,
};

use crate::{
    database::StoreError,
    domain::{catalog::CatalogError, orders::OrdersError},
};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart not found")]
    CartNotFound,

    #[error("cart item {0} not found")]
    CartItemNotFound(CartItemUuid),

    #[error("product {0} is unavailable")]
    ProductUnavailable(ProductUuid),

    #[error("offer {0} not found")]
    OfferNotFound(OfferUuid),

    #[error(transparent)]
    Cart(CartError),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    Offer(#[from] OfferError),

    #[error("cart could not be priced")]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Repricing before checkout changed the cart; the client has to review it.
    #[error("cart changed while checking out")]
    CartChanged(Vec<CartNotice>),

    #[error("catalog unavailable")]
    CatalogUnavailable(#[source] CatalogError),

    #[error("order service unavailable")]
    OrdersUnavailable(#[source] OrdersError),

    #[error("storage error")]
    Storage(#[source] StoreError),
}

impl From<CartError> for CartsServiceError {
    fn from(error: CartError) -> Self {
        match error {
            CartError::ItemNotFound(item) => Self::CartItemNotFound(item),
            CartError::ProductUnavailable(product) => Self::ProductUnavailable(product),
            other => Self::Cart(other),
        }
    }
}

impl From<CatalogError> for CartsServiceError {
    fn from(error: CatalogError) -> Self {
        Self::CatalogUnavailable(error)
    }
}

impl From<OrdersError> for CartsServiceError {
    fn from(error: OrdersError) -> Self {
        Self::OrdersUnavailable(error)
    }
}

impl From<StoreError> for CartsServiceError {
    fn from(error: StoreError) -> Self {
        Self::Storage(error)
    }
}
