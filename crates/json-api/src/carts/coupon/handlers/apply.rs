//! Apply Coupon Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Apply Coupon Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ApplyCouponRequest {
    /// Coupon code, matched case-insensitively
    pub code: String,
}

/// Apply Coupon Handler
///
/// Attaches a coupon, replacing any coupon already on the cart.
#[endpoint(
    tags("cart"),
    summary = "Apply Coupon",
    responses(
        (status_code = StatusCode::OK, description = "Coupon applied"),
        (status_code = StatusCode::NOT_FOUND, description = "Unknown coupon or no cart yet"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Coupon does not apply to this cart"),
    ),
)]
#[tracing::instrument(
    name = "cart.coupon.apply",
    skip(json, depot),
    fields(owner = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<ApplyCouponRequest>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.cart_owner_or_401()?;
    let request = json.into_inner();

    if request.code.trim().is_empty() {
        return Err(StatusError::bad_request()
            .brief("Coupon code is required")
            .detail("coupon_code_required")
            .into());
    }

    tracing::Span::current().record("owner", tracing::field::display(&owner));

    let priced = state
        .carts()
        .apply_coupon(&owner, &request.code)
        .await
        .map_err(into_status_error)?;

    Ok(Json(priced.into()))
}
