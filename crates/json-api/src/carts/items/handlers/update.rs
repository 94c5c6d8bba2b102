//! Update Cart Item Handler

use std::sync::Arc;

use rust_decimal::Decimal;
use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trolley::items::CartItemUuid;

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Update Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateCartItemRequest {
    /// New quantity; zero removes the line
    #[salvo(schema(value_type = String))]
    pub quantity: Decimal,
}

/// Update Cart Item Handler
#[endpoint(
    tags("cart"),
    summary = "Change Item Quantity",
    responses(
        (status_code = StatusCode::OK, description = "Quantity changed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart or line not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid quantity or out of stock"),
    ),
)]
#[tracing::instrument(
    name = "cart.items.update",
    skip(item, json, depot),
    fields(
        owner = tracing::field::Empty,
        item = tracing::field::Empty,
        quantity = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    item: PathParam<Uuid>,
    json: JsonBody<UpdateCartItemRequest>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.cart_owner_or_401()?;
    let item = CartItemUuid::from_uuid(item.into_inner());
    let quantity = json.into_inner().quantity;

    let span = tracing::Span::current();

    span.record("owner", tracing::field::display(&owner));
    span.record("item", tracing::field::display(item));
    span.record("quantity", tracing::field::display(quantity));

    let priced = state
        .carts()
        .update_item(&owner, item, quantity)
        .await
        .map_err(into_status_error)?;

    Ok(Json(priced.into()))
}
