//! Remove Coupon Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Remove Coupon Handler
#[endpoint(
    tags("cart"),
    summary = "Remove Coupon",
    responses(
        (status_code = StatusCode::OK, description = "Coupon removed"),
        (status_code = StatusCode::NOT_FOUND, description = "No cart yet"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.cart_owner_or_401()?;

    let priced = state
        .carts()
        .remove_coupon(&owner)
        .await
        .map_err(into_status_error)?;

    Ok(Json(priced.into()))
}
