//! Checkout route handlers.
//!
//! The payment itself happens in an external gateway flow; these endpoints
//! only record its outcome and turn a paid session into an order.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use rust_decimal::Decimal;
use serde::Deserialize;
use tamarind_core::CheckoutId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{CheckoutItem, CheckoutSession, ShippingAddress};
use crate::state::AppState;

/// Request to open a checkout session.
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub checkout_items: Vec<CheckoutItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub total_price: Decimal,
}

/// Payment outcome reported by the client after the gateway flow.
#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub payment_status: String,
    #[serde(default)]
    pub payment_details: Option<serde_json::Value>,
}

/// Open a pending checkout session.
///
/// POST /api/checkout
///
/// # Errors
///
/// `Validation` when `checkout_items` is empty.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiJson(body): ApiJson<CreateCheckoutRequest>,
) -> Result<impl IntoResponse> {
    let session = state
        .checkouts()
        .create(
            principal.id,
            body.checkout_items,
            body.shipping_address,
            body.payment_method,
            body.total_price,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Record a payment on a session.
///
/// PUT /api/checkout/{id}/pay
///
/// # Errors
///
/// `NotFound` for an unknown session, `Forbidden` for a caller who is
/// neither the owner nor an admin, `Validation` for any status other than
/// `"paid"`.
pub async fn pay(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<CheckoutId>,
    ApiJson(body): ApiJson<PayRequest>,
) -> Result<Json<CheckoutSession>> {
    let session = state
        .checkouts()
        .pay(&principal, id, &body.payment_status, body.payment_details)
        .await?;
    Ok(Json(session))
}

/// Finalize a paid session into an order.
///
/// POST /api/checkout/{id}/finalize
///
/// # Errors
///
/// `NotFound` for an unknown session, `Forbidden` for a caller who is
/// neither the owner nor an admin, `Conflict` when already finalized,
/// `Validation` when not paid yet.
pub async fn finalize(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<CheckoutId>,
) -> Result<impl IntoResponse> {
    let order = state.checkouts().finalize(&principal, id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
