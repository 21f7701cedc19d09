//! Newsletter subscription route handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use tamarind_core::Email;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::models::Subscriber;
use crate::routes::MessageResponse;
use crate::state::AppState;
use crate::store::{StoreError, SubscriberStore};

/// Newsletter subscription request.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// Subscribe an email address to the newsletter.
///
/// POST /api/subscribe
///
/// # Errors
///
/// `Validation` for a missing or malformed address, `Conflict` when it is
/// already subscribed.
#[instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SubscribeRequest>,
) -> Result<impl IntoResponse> {
    let raw = body.email.unwrap_or_default();
    if raw.trim().is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    let email = Email::parse(&raw).map_err(|e| AppError::Validation(e.to_string()))?;

    let subscriber = Subscriber::new(email);
    match state.store().insert_subscriber(&subscriber).await {
        Ok(()) => {}
        Err(StoreError::DuplicateKey(_)) => {
            return Err(AppError::Conflict("Email is already subscribed".to_string()));
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!(email = %subscriber.email, "newsletter subscription created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Successfully subscribed to the newsletter!",
        )),
    ))
}
