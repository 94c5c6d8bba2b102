//! Accept Offer Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trolley::{catalog::ProductUuid, offers::OfferUuid};
use trolley_app::domain::carts::models::AcceptedOffer;

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Accept Offer Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AcceptOfferRequest {
    pub offer_id: Uuid,

    /// Product being viewed, for product page offers
    #[serde(default)]
    pub product_id: Option<Uuid>,
}

/// Accepted Offer Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AcceptedOfferResponse {
    pub offer_id: Uuid,

    /// Offer this one replaced
    pub superseded_offer_id: Option<Uuid>,

    pub cart: CartResponse,
}

impl From<AcceptedOffer> for AcceptedOfferResponse {
    fn from(accepted: AcceptedOffer) -> Self {
        Self {
            offer_id: accepted.offer.into_uuid(),
            superseded_offer_id: accepted.superseded.map(OfferUuid::into_uuid),
            cart: accepted.priced.into(),
        }
    }
}

/// Accept Offer Handler
///
/// Accepts an offer if it still matches the cart. At most one offer is
/// active; accepting another replaces it.
#[endpoint(
    tags("cart"),
    summary = "Accept Cart Offer",
    responses(
        (status_code = StatusCode::OK, description = "Offer accepted"),
        (status_code = StatusCode::NOT_FOUND, description = "Unknown offer or no cart yet"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Offer no longer eligible"),
    ),
)]
#[tracing::instrument(
    name = "cart.offers.accept",
    skip(json, depot),
    fields(owner = tracing::field::Empty, offer = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<AcceptOfferRequest>,
    depot: &mut Depot,
) -> Result<Json<AcceptedOfferResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.cart_owner_or_401()?;
    let request = json.into_inner();
    let offer = OfferUuid::from_uuid(request.offer_id);

    let span = tracing::Span::current();

    span.record("owner", tracing::field::display(&owner));
    span.record("offer", tracing::field::display(offer));

    let accepted = state
        .carts()
        .accept_offer(&owner, offer, request.product_id.map(ProductUuid::from_uuid))
        .await
        .map_err(into_status_error)?;

    Ok(Json(accepted.into()))
}
