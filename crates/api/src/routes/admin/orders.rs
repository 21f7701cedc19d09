//! Admin order management handlers.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use tamarind_core::{OrderId, OrderStatus};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::models::Order;
use crate::routes::MessageResponse;
use crate::state::AppState;
use crate::store::OrderStore;

/// Request to move an order to a new fulfillment status.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: OrderStatus,
}

/// All orders across all users, newest first.
///
/// GET /api/admin/orders
///
/// # Errors
///
/// Propagates store failures.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    let orders = state.store().list_orders().await?;
    Ok(Json(orders))
}

/// Update the fulfillment status of an order.
///
/// PUT /api/admin/orders/{id}
///
/// Setting `delivered` also flips the delivery flag and stamps
/// `delivered_at`; moving away keeps the old timestamp.
///
/// # Errors
///
/// `NotFound` for an unknown order, `Validation` for an unknown status.
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<UpdateOrderRequest>,
) -> Result<Json<Order>> {
    let mut order = state
        .store()
        .find_order(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    order.set_status(body.status);
    if !state.store().update_order(&order).await? {
        return Err(AppError::NotFound("Order not found".to_string()));
    }
    Ok(Json(order))
}

/// Delete an order.
///
/// DELETE /api/admin/orders/{id}
///
/// # Errors
///
/// `NotFound` for an unknown order.
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<MessageResponse>> {
    if !state.store().delete_order(id).await? {
        return Err(AppError::NotFound("Order not found".to_string()));
    }
    Ok(Json(MessageResponse::new("Order removed")))
}
