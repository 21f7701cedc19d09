//! Order route handlers.

use axum::Json;
use axum::extract::State;
use tamarind_core::OrderId;

use crate::error::{AppError, Result};
use crate::extract::ApiPath;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::state::AppState;
use crate::store::OrderStore;

/// The caller's orders, newest first.
///
/// GET /api/orders/my-orders
///
/// # Errors
///
/// Propagates store failures.
pub async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = state.store().list_orders_for_user(principal.id).await?;
    Ok(Json(orders))
}

/// Order detail, restricted to the owner or an admin.
///
/// GET /api/orders/{id}
///
/// # Errors
///
/// `NotFound` for an unknown order, `Forbidden` for anyone else's order.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    let order = state
        .store()
        .find_order(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    if order.user != principal.id && !principal.role.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to view this order".to_string(),
        ));
    }
    Ok(Json(order))
}
