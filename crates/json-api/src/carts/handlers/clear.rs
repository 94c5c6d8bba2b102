//! Clear Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Clear Cart Handler
///
/// Removes every line, the coupon and any offer. An owner without a cart
/// gets an empty one back; nothing is stored for them.
#[endpoint(
    tags("cart"),
    summary = "Empty Cart",
    responses(
        (status_code = StatusCode::OK, description = "Emptied cart"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing identity"),
    ),
)]
#[tracing::instrument(
    name = "cart.clear",
    skip(depot),
    fields(owner = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.cart_owner_or_401()?;

    tracing::Span::current().record("owner", tracing::field::display(&owner));

    let priced = state
        .carts()
        .clear_cart(&owner)
        .await
        .map_err(into_status_error)?;

    Ok(Json(priced.into()))
}
