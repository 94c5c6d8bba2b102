//! Resolve Offer Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trolley::{catalog::ProductUuid, offers::Placement};

use crate::{
    carts::{errors::into_status_error, responses::ResolvedOfferResponse},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Resolve Offer Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ResolveOfferResponse {
    /// Best matching offer, if any
    pub offer: Option<ResolvedOfferResponse>,
}

/// Resolve Offer Handler
///
/// Looks up the best offer for the cart at a storefront placement without
/// changing the cart.
#[endpoint(
    tags("cart"),
    summary = "Resolve Cart Offer",
    responses(
        (status_code = StatusCode::OK, description = "Best offer, or none"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown placement"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Catalog unavailable"),
    ),
)]
pub(crate) async fn handler(
    placement: QueryParam<String, true>,
    product_id: QueryParam<Uuid, false>,
    depot: &mut Depot,
) -> Result<Json<ResolveOfferResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.cart_owner_or_401()?;

    let placement = placement.into_inner().parse::<Placement>().map_err(|error| {
        StatusError::bad_request()
            .brief(error.to_string())
            .detail("unknown_placement")
    })?;

    let viewing = product_id.into_inner().map(ProductUuid::from_uuid);

    let resolved = state
        .carts()
        .resolve_offer(&owner, placement, viewing)
        .await
        .map_err(into_status_error)?;

    Ok(Json(ResolveOfferResponse {
        offer: resolved.map(ResolvedOfferResponse::from),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use smallvec::SmallVec;
    use testresult::TestResult;
    use trolley::offers::{OfferDiscount, OfferUuid, ResolvedOffer};
    use trolley_app::domain::carts::MockCartsService;

    use crate::test_helpers::{carts_service, guest_owner};

    use super::*;

    fn make_service(carts: MockCartsService) -> Service {
        carts_service(carts, Router::with_path("cart/offers/resolve").get(handler))
    }

    #[tokio::test]
    async fn test_resolve_returns_offer() -> TestResult {
        let offer = OfferUuid::new();
        let product = ProductUuid::new();

        let mut carts = MockCartsService::new();

        carts
            .expect_resolve_offer()
            .once()
            .withf(move |owner, placement, viewing| {
                *owner == guest_owner()
                    && *placement == Placement::ProductPage
                    && *viewing == Some(product)
            })
            .return_once(move |_, placement, _| {
                Ok(Some(ResolvedOffer {
                    offer,
                    name: "Mug with kettle".to_string(),
                    placement,
                    discount: OfferDiscount::AmountOverride { amount: 500 },
                    discount_total: 350,
                    lines: SmallVec::new(),
                }))
            });

        let mut res = TestClient::get(format!(
            "http://example.com/cart/offers/resolve?placement=product_page&product_id={product}"
        ))
        .send(&make_service(carts))
        .await;

        let body: ResolveOfferResponse = res.take_json().await?;
        let resolved = body.offer.ok_or("expected an offer")?;

        assert_eq!(resolved.offer_id, offer.into_uuid());
        assert_eq!(resolved.placement, "product_page");
        assert_eq!(resolved.discount_total, 350);

        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_without_match_returns_empty() -> TestResult {
        let mut carts = MockCartsService::new();

        carts
            .expect_resolve_offer()
            .once()
            .return_once(|_, _, _| Ok(None));

        let mut res = TestClient::get("http://example.com/cart/offers/resolve?placement=cart")
            .send(&make_service(carts))
            .await;

        let body: ResolveOfferResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.offer.is_none(), "expected no offer");

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_placement_returns_400() {
        let mut carts = MockCartsService::new();

        carts.expect_resolve_offer().never();

        let res = TestClient::get("http://example.com/cart/offers/resolve?placement=footer")
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }
}
