//! Public catalog route handlers.

use axum::Json;
use axum::extract::State;
use tamarind_core::ProductId;

use crate::error::Result;
use crate::extract::ApiPath;
use crate::models::Product;
use crate::state::AppState;

/// Published products, newest first.
///
/// GET /api/products
///
/// # Errors
///
/// Propagates store failures.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().list_published().await?;
    Ok(Json(products))
}

/// Product detail.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// `NotFound` for an unknown product.
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    let product = state.catalog().find(id).await?;
    Ok(Json(product))
}
