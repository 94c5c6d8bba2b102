//! Merge Carts Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Merge Carts Handler
///
/// Called right after login: folds the guest cart of `x-session-token` into
/// the cart of `x-customer-uuid` and returns the customer cart.
#[endpoint(
    tags("cart"),
    summary = "Merge Guest Cart",
    responses(
        (status_code = StatusCode::OK, description = "Merged customer cart"),
        (status_code = StatusCode::BAD_REQUEST, description = "Both identity headers are required"),
        (status_code = StatusCode::NOT_FOUND, description = "Neither cart exists"),
    ),
)]
#[tracing::instrument(
    name = "cart.merge",
    skip(depot),
    fields(customer = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let (Some(customer), Some(session)) = (identity.customer, identity.session.clone()) else {
        return Err(StatusError::bad_request()
            .brief("Merging needs both x-session-token and x-customer-uuid")
            .detail("merge_identity_required")
            .into());
    };

    tracing::Span::current().record("customer", tracing::field::display(customer));

    let priced = state
        .carts()
        .merge_carts(session, customer)
        .await
        .map_err(into_status_error)?;

    tracing::info!(cart = %priced.cart.uuid, "merged guest cart");

    Ok(Json(priced.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;
    use trolley::cart::{CartOwner, CustomerUuid, SessionToken};
    use trolley_app::domain::carts::MockCartsService;

    use crate::{
        identity::{CUSTOMER_HEADER, SESSION_HEADER},
        test_helpers::{carts_service_with_headers, make_cart, priced},
    };

    use super::*;

    fn make_service(carts: MockCartsService) -> Service {
        carts_service_with_headers(carts, Router::with_path("cart/merge").post(handler))
    }

    #[tokio::test]
    async fn test_merge_folds_session_into_customer() -> TestResult {
        let customer = CustomerUuid::new();
        let cart = make_cart(CartOwner::Customer(customer));
        let uuid = cart.uuid;

        let mut carts = MockCartsService::new();

        carts
            .expect_merge_carts()
            .once()
            .withf(move |session, requested| {
                *session == SessionToken::new("tab-1") && *requested == customer
            })
            .return_once(move |_, _| Ok(priced(cart)));

        let mut res = TestClient::post("http://example.com/cart/merge")
            .add_header(SESSION_HEADER, "tab-1", true)
            .add_header(CUSTOMER_HEADER, customer.to_string(), true)
            .send(&make_service(carts))
            .await;

        let body: CartResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.uuid, uuid.into_uuid());

        Ok(())
    }

    #[tokio::test]
    async fn test_merge_without_session_returns_400() {
        let mut carts = MockCartsService::new();

        carts.expect_merge_carts().never();

        let res = TestClient::post("http://example.com/cart/merge")
            .add_header(CUSTOMER_HEADER, CustomerUuid::new().to_string(), true)
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }
}
