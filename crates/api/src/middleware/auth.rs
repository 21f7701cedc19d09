//! Authentication extractors for bearer-token requests.
//!
//! Tokens are minted by an external identity flow (see
//! [`TokenService`](crate::services::TokenService)); this layer verifies the
//! signature and resolves the user document behind it. Handlers pick the
//! extractor matching their access rule.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tamarind_core::{Email, Role, UserId};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::state::AppState;
use crate::store::UserStore;

/// The authenticated caller: the user document behind a verified token.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn invalid_token() -> AppError {
    AppError::Unauthorized("Invalid token, authorization denied".to_string())
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Principal, AppError> {
    let token = bearer_token(parts)
        .ok_or_else(|| AppError::Unauthorized("Not authorized".to_string()))?;
    let user_id = state.tokens().verify(token).ok_or_else(invalid_token)?;
    // A valid signature over a deleted user is still not a principal.
    let user = state
        .store()
        .find_user(user_id)
        .await?
        .ok_or_else(invalid_token)?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(Principal::from(user))
}

/// Extractor that requires a valid bearer token.
///
/// Responds 401 when the header is missing and 401 with a distinct message
/// when the token is present but invalid.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(principal): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", principal.name)
/// }
/// ```
pub struct RequireAuth(pub Principal);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await.map(Self)
    }
}

/// Extractor that optionally resolves the caller.
///
/// Unlike `RequireAuth`, this never rejects: a missing or invalid token
/// yields `None` and the request proceeds anonymously. Cart routes pair
/// this with a guest id.
pub struct OptionalAuth(pub Option<Principal>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve(parts, state).await.ok()))
    }
}

/// Extractor that requires an authenticated admin.
///
/// Responds 401 like `RequireAuth` for missing or invalid tokens and 403
/// for an authenticated non-admin.
pub struct RequireAdmin(pub Principal);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = resolve(parts, state).await?;
        if !principal.role.is_admin() {
            return Err(AppError::Forbidden("Not authorized as admin".to_string()));
        }
        Ok(Self(principal))
    }
}
