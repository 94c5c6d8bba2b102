//! App Router

use salvo::Router;

use crate::{carts, identity};

/// Everything under `/cart`, scoped to the caller's identity headers.
pub(crate) fn cart_router() -> Router {
    Router::with_path("cart")
        .hoop(identity::handler)
        .get(carts::get::handler)
        .delete(carts::clear::handler)
        .push(
            Router::with_path("items")
                .post(carts::items::create::handler)
                .push(
                    Router::with_path("{item}")
                        .put(carts::items::update::handler)
                        .delete(carts::items::delete::handler),
                ),
        )
        .push(
            Router::with_path("coupon")
                .post(carts::coupon::apply::handler)
                .delete(carts::coupon::remove::handler),
        )
        .push(
            Router::with_path("offers")
                .push(Router::with_path("resolve").get(carts::offers::resolve::handler))
                .push(Router::with_path("accept").post(carts::offers::accept::handler)),
        )
        .push(Router::with_path("merge").post(carts::merge::handler))
        .push(Router::with_path("checkout").post(carts::checkout::handler))
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;
    use trolley_app::domain::carts::MockCartsService;

    use crate::{
        carts::responses::CartResponse,
        identity::SESSION_HEADER,
        test_helpers::{guest_owner, make_cart, priced, state_with_carts},
    };

    use super::*;

    fn make_service(carts: MockCartsService) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(state_with_carts(carts)))
                .push(cart_router()),
        )
    }

    #[tokio::test]
    async fn test_cart_routes_require_identity() {
        let mut carts = MockCartsService::new();

        carts.expect_clear_cart().never();

        let res = TestClient::delete("http://example.com/cart")
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_coupon_route_reaches_service() -> TestResult {
        let cart = make_cart(guest_owner());

        let mut carts = MockCartsService::new();

        carts
            .expect_remove_coupon()
            .once()
            .withf(|owner| *owner == guest_owner())
            .return_once(move |_| Ok(priced(cart)));

        let mut res = TestClient::delete("http://example.com/cart/coupon")
            .add_header(SESSION_HEADER, "tab-1", true)
            .send(&make_service(carts))
            .await;

        let body: CartResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.coupon, None);

        Ok(())
    }
}
