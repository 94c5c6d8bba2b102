//! Errors

use salvo::http::StatusError;
use tracing::{error, warn};
use trolley::{
    cart::{CartError, CartNotice},
    checkout::CheckoutError,
    coupons::CouponError,
    offers::OfferError,
};
use trolley_app::domain::carts::CartsServiceError;

use crate::observability::observe_cart_error;

/// Machine-readable code for an error, sent to clients as the `code` of the
/// error body.
pub(crate) fn error_code(error: &CartsServiceError) -> &'static str {
    match error {
        CartsServiceError::CartNotFound => "cart_not_found",
        CartsServiceError::CartItemNotFound(_) => "cart_item_not_found",
        CartsServiceError::ProductUnavailable(_) => "product_unavailable",
        CartsServiceError::OfferNotFound(_) => "offer_not_found",
        CartsServiceError::Cart(error) => match error {
            CartError::InvalidQuantity(_) => "invalid_quantity",
            CartError::OutOfStock(_) => "out_of_stock",
            CartError::ItemNotFound(_) => "cart_item_not_found",
            CartError::ProductUnavailable(_) => "product_unavailable",
            CartError::CurrencyMismatch { .. } => "currency_mismatch",
            CartError::Overflow => "quantity_overflow",
        },
        CartsServiceError::Coupon(error) => error.code(),
        CartsServiceError::Offer(OfferError::NoLongerEligible(_)) => "offer_no_longer_eligible",
        CartsServiceError::Offer(OfferError::Amount(_)) | CartsServiceError::Pricing(_) => {
            "pricing_failed"
        }
        CartsServiceError::Checkout(error) => match error {
            CheckoutError::EmptyCart => "empty_cart",
            CheckoutError::ProductUnavailable { .. } => "product_unavailable",
            CheckoutError::InvalidQuantity { .. } => "invalid_quantity",
            CheckoutError::OutOfStock { .. } => "out_of_stock",
        },
        CartsServiceError::CartChanged(_) => "cart_changed",
        CartsServiceError::CatalogUnavailable(_) => "catalog_unavailable",
        CartsServiceError::OrdersUnavailable(_) => "orders_unavailable",
        CartsServiceError::Storage(_) => "storage_failed",
    }
}

pub(crate) fn into_status_error(error: CartsServiceError) -> StatusError {
    let code = error_code(&error);

    observe_cart_error(code);

    let status = match &error {
        CartsServiceError::CartNotFound
        | CartsServiceError::CartItemNotFound(_)
        | CartsServiceError::OfferNotFound(_)
        | CartsServiceError::Coupon(CouponError::NotFound(_)) => {
            StatusError::not_found().brief(error.to_string())
        }
        CartsServiceError::ProductUnavailable(_)
        | CartsServiceError::Cart(_)
        | CartsServiceError::Coupon(_)
        | CartsServiceError::Offer(OfferError::NoLongerEligible(_))
        | CartsServiceError::Checkout(_) => {
            StatusError::unprocessable_entity().brief(error.to_string())
        }
        CartsServiceError::CartChanged(notices) => {
            StatusError::conflict().brief(cart_changed_brief(notices))
        }
        CartsServiceError::CatalogUnavailable(source) => {
            warn!("catalog unavailable: {source}");

            StatusError::service_unavailable().brief("Catalog is unavailable, try again")
        }
        CartsServiceError::OrdersUnavailable(source) => {
            warn!("order service unavailable: {source}");

            StatusError::service_unavailable().brief("Order service is unavailable, try again")
        }
        CartsServiceError::Offer(OfferError::Amount(source)) => {
            error!("failed to price offer: {source}");

            StatusError::internal_server_error()
        }
        CartsServiceError::Pricing(source) => {
            error!("failed to price cart: {source}");

            StatusError::internal_server_error()
        }
        CartsServiceError::Storage(source) => {
            error!("cart storage failed: {source}");

            StatusError::internal_server_error()
        }
    };

    status.detail(code)
}

fn cart_changed_brief(notices: &[CartNotice]) -> String {
    let changes = notices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");

    format!("Cart changed while checking out, review it and try again: {changes}")
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::http::StatusCode;
    use trolley::{items::CartItemUuid, offers::OfferUuid};

    use super::*;

    #[test]
    fn unknown_lines_are_not_found() {
        let status = into_status_error(CartsServiceError::CartItemNotFound(CartItemUuid::new()));

        assert_eq!(status.code, StatusCode::NOT_FOUND);
        assert_eq!(status.detail.as_deref(), Some("cart_item_not_found"));
    }

    #[test]
    fn coupon_failures_carry_their_code() {
        let expired = CouponError::Expired {
            expired_at: Timestamp::UNIX_EPOCH,
        };

        let status = into_status_error(CartsServiceError::Coupon(expired));

        assert_eq!(status.code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status.detail.as_deref(), Some("coupon_expired"));
    }

    #[test]
    fn unknown_coupons_are_not_found() {
        let status = into_status_error(CartsServiceError::Coupon(CouponError::NotFound(
            "NOPE".to_string(),
        )));

        assert_eq!(status.code, StatusCode::NOT_FOUND);
        assert_eq!(status.detail.as_deref(), Some("coupon_not_found"));
    }

    #[test]
    fn stale_offers_are_unprocessable() {
        let offer = OfferUuid::new();
        let status =
            into_status_error(CartsServiceError::Offer(OfferError::NoLongerEligible(offer)));

        assert_eq!(status.code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status.detail.as_deref(), Some("offer_no_longer_eligible"));
    }

    #[test]
    fn changed_carts_conflict() {
        let offer = OfferUuid::new();
        let status = into_status_error(CartsServiceError::CartChanged(vec![
            CartNotice::OfferExpired { offer },
        ]));

        assert_eq!(status.code, StatusCode::CONFLICT);
        assert_eq!(status.detail.as_deref(), Some("cart_changed"));
        assert!(
            status.brief.contains(&offer.to_string()),
            "expected the notice in the brief"
        );
    }
}
