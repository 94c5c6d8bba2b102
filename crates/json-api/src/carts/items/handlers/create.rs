//! Add Cart Item Handler

use std::{collections::BTreeMap, sync::Arc};

use rust_decimal::Decimal;
use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trolley::{
    catalog::{ProductUuid, SnapshotKey, VariantUuid},
    items::{CartItem, ItemOptions},
};
use trolley_app::domain::carts::models::NewCartItem;

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Add Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddCartItemRequest {
    pub product_id: Uuid,

    #[serde(default)]
    pub product_variant_id: Option<Uuid>,

    /// Whole units, or a stepped decimal for products sold by measure
    #[salvo(schema(value_type = String))]
    pub quantity: Decimal,

    /// Options that keep otherwise identical lines apart
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl From<AddCartItemRequest> for NewCartItem {
    fn from(request: AddCartItemRequest) -> Self {
        NewCartItem {
            product: ProductUuid::from_uuid(request.product_id),
            variant: request.product_variant_id.map(VariantUuid::from_uuid),
            quantity: request.quantity,
            options: request.options,
        }
    }
}

/// Add Cart Item Handler
///
/// Adds a product, merging into an existing line with the same product,
/// variant and options. The cart is created on first use.
#[endpoint(
    tags("cart"),
    summary = "Add Item to Cart",
    responses(
        (status_code = StatusCode::CREATED, description = "Item added"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid quantity, out of stock or unavailable product"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Catalog unavailable"),
    ),
)]
#[tracing::instrument(
    name = "cart.items.create",
    skip(json, depot, res),
    fields(
        owner = tracing::field::Empty,
        product = tracing::field::Empty,
        quantity = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<AddCartItemRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CartResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.cart_owner_or_401()?;
    let item = NewCartItem::from(json.into_inner());

    let span = tracing::Span::current();

    span.record("owner", tracing::field::display(&owner));
    span.record("product", tracing::field::display(item.product));
    span.record("quantity", tracing::field::display(item.quantity));

    let key = item.key();
    let options = item.options.clone();

    let priced = state
        .carts()
        .add_item(&owner, item)
        .await
        .map_err(into_status_error)?;

    if let Some(line) = line_for(&priced.cart.items, &key, &options) {
        res.add_header(LOCATION, format!("/cart/items/{line}"), true)
            .or_500("failed to set location header")?;
    }

    res.status_code(StatusCode::CREATED);

    Ok(Json(priced.into()))
}

fn line_for(items: &[CartItem], key: &SnapshotKey, options: &ItemOptions) -> Option<Uuid> {
    items
        .iter()
        .find(|line| line.is_same_line(key, options))
        .map(|line| line.uuid.into_uuid())
}
