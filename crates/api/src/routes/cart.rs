//! Cart route handlers.
//!
//! Cart endpoints are public: a signed-in caller is identified by their
//! bearer token, an anonymous one by the `guest_id` they send along. A
//! first add without either mints a guest identity, returned in the cart's
//! `owner` field for the client to persist.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use tamarind_core::{GuestId, ProductId};

use crate::error::Result;
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::Cart;
use crate::state::AppState;

const fn default_quantity() -> i64 {
    1
}

/// Request to add a product to the cart.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub size: String,
    pub color: String,
    pub guest_id: Option<GuestId>,
}

/// Request to set the quantity of an existing line.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    pub size: String,
    pub color: String,
    pub guest_id: Option<GuestId>,
}

/// Request to remove a line from the cart.
#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub guest_id: Option<GuestId>,
}

/// Query parameters for fetching a cart.
#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub guest_id: Option<GuestId>,
}

/// Request to merge a guest cart into the caller's cart.
#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub guest_id: Option<GuestId>,
}

/// Add a product to the cart.
///
/// POST /api/cart
///
/// Responds 201 when the cart was created by this call, 200 otherwise.
///
/// # Errors
///
/// `Validation` for a non-positive quantity, `NotFound` for an unknown
/// product.
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<impl IntoResponse> {
    let (cart, created) = state
        .carts()
        .add_item(
            auth.map(|p| p.id),
            body.guest_id,
            body.product_id,
            body.quantity,
            body.size,
            body.color,
        )
        .await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(cart)))
}

/// Set the quantity of a cart line; zero or less removes it.
///
/// PUT /api/cart
///
/// # Errors
///
/// `NotFound` when the cart or the line does not exist.
pub async fn update(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    ApiJson(body): ApiJson<UpdateItemRequest>,
) -> Result<Json<Cart>> {
    let cart = state
        .carts()
        .update_quantity(
            auth.map(|p| p.id),
            body.guest_id,
            body.product_id,
            body.quantity,
            body.size,
            body.color,
        )
        .await?;
    Ok(Json(cart))
}

/// Remove a line from the cart.
///
/// DELETE /api/cart
///
/// # Errors
///
/// `NotFound` when the cart or the line does not exist.
pub async fn remove(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    ApiJson(body): ApiJson<RemoveItemRequest>,
) -> Result<Json<Cart>> {
    let cart = state
        .carts()
        .remove_item(
            auth.map(|p| p.id),
            body.guest_id,
            body.product_id,
            body.size,
            body.color,
        )
        .await?;
    Ok(Json(cart))
}

/// Fetch the caller's cart.
///
/// GET /api/cart?guest_id=...
///
/// # Errors
///
/// `NotFound` when the caller has no cart.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    ApiQuery(query): ApiQuery<CartQuery>,
) -> Result<Json<Cart>> {
    let cart = state
        .carts()
        .fetch(auth.map(|p| p.id), query.guest_id)
        .await?;
    Ok(Json(cart))
}

/// Merge the guest cart into the signed-in caller's cart.
///
/// POST /api/cart/merge
///
/// # Errors
///
/// `NotFound` when there is no guest cart and no user cart to fall back
/// on, `Validation` when the guest cart is empty.
pub async fn merge(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiJson(body): ApiJson<MergeRequest>,
) -> Result<Json<Cart>> {
    let cart = state.carts().merge(principal.id, body.guest_id).await?;
    Ok(Json(cart))
}
