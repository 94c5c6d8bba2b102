//! Checkout Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{errors::into_status_error, responses::OrderReceiptResponse},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Checkout Handler
///
/// Reprices the cart one last time and submits it as an order. When
/// repricing changed anything the order is not placed and 409 is returned;
/// fetch the cart to see what changed.
#[endpoint(
    tags("cart"),
    summary = "Checkout",
    responses(
        (status_code = StatusCode::CREATED, description = "Order submitted"),
        (status_code = StatusCode::NOT_FOUND, description = "No cart yet"),
        (status_code = StatusCode::CONFLICT, description = "Cart changed while checking out"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Cart cannot be ordered"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Catalog or order service unavailable"),
    ),
)]
#[tracing::instrument(
    name = "cart.checkout",
    skip(depot, res),
    fields(owner = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderReceiptResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.cart_owner_or_401()?;

    tracing::Span::current().record("owner", tracing::field::display(&owner));

    let receipt = state
        .carts()
        .checkout(&owner)
        .await
        .map_err(into_status_error)?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(receipt.into()))
}
