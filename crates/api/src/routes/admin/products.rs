//! Admin catalog management handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tamarind_core::ProductId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductInput, ProductPatch};
use crate::routes::MessageResponse;
use crate::state::AppState;

/// Every product, including unpublished ones, newest first.
///
/// GET /api/admin/products
///
/// # Errors
///
/// Propagates store failures.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().list_all().await?;
    Ok(Json(products))
}

/// Create a product, attributed to the calling admin.
///
/// POST /api/admin/products
///
/// # Errors
///
/// `Validation` for bad input, `Conflict` for a duplicate SKU.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<impl IntoResponse> {
    let product = state.catalog().create(input, admin.id).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Apply a partial update to a product.
///
/// PUT /api/admin/products/{id}
///
/// # Errors
///
/// `NotFound` for an unknown product, `Validation` for bad input.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<Product>> {
    let product = state.catalog().update(id, patch).await?;
    Ok(Json(product))
}

/// Delete a product.
///
/// DELETE /api/admin/products/{id}
///
/// # Errors
///
/// `NotFound` for an unknown product.
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<MessageResponse>> {
    state.catalog().delete(id).await?;
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
