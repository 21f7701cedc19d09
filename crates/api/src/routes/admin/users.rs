//! Admin user management handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tamarind_core::{Email, Role, UserId};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::models::{User, UserPatch};
use crate::routes::MessageResponse;
use crate::state::AppState;
use crate::store::{StoreError, UserStore};

/// Request to create a user account.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Partial user update; absent fields keep their stored values.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// User document plus an outcome message.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

/// All users, oldest first.
///
/// GET /api/admin/users
///
/// # Errors
///
/// Propagates store failures.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    let users = state.store().list_users().await?;
    Ok(Json(users))
}

/// Create a user account; the role defaults to customer.
///
/// POST /api/admin/users
///
/// # Errors
///
/// `Validation` for a bad name or email, `Conflict` when the email is
/// taken.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    let email = Email::parse(&body.email).map_err(|e| AppError::Validation(e.to_string()))?;

    let user = User::new(body.name, email, body.role.unwrap_or_default());
    match state.store().insert_user(&user).await {
        Ok(()) => {}
        Err(StoreError::DuplicateKey(_)) => {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User created successfully".to_string(),
            user,
        }),
    ))
}

/// Apply a partial update to a user.
///
/// PUT /api/admin/users/{id}
///
/// # Errors
///
/// `NotFound` for an unknown user, `Validation` for a bad email,
/// `Conflict` when the new email is taken.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let mut user = state
        .store()
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let email = match body.email {
        Some(raw) => Some(Email::parse(&raw).map_err(|e| AppError::Validation(e.to_string()))?),
        None => None,
    };
    user.apply(UserPatch {
        name: body.name,
        email,
        role: body.role,
    });

    match state.store().update_user(&user).await {
        Ok(true) => {}
        Ok(false) => return Err(AppError::NotFound("User not found".to_string())),
        Err(StoreError::DuplicateKey(_)) => {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Json(UserResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

/// Delete a user account.
///
/// DELETE /api/admin/users/{id}
///
/// # Errors
///
/// `NotFound` for an unknown user.
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<MessageResponse>> {
    if !state.store().delete_user(id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
