//! Bearer token minting for local development.
//!
//! The API only verifies tokens; minting normally happens at the external
//! identity issuer. This command signs one offline with the shared secret
//! so a developer can call authenticated endpoints against a local server.
//!
//! # Usage
//!
//! ```bash
//! tamarind-cli token --user-id 2f5a1b7e-9c44-4c1e-8d3a-64f0a1b2c3d4
//! ```
//!
//! # Environment Variables
//!
//! - `AUTH_SECRET` - shared secret the API verifies tokens with

use secrecy::SecretString;
use thiserror::Error;

use tamarind_api::services::TokenService;
use tamarind_api::services::tokens::InvalidKey;
use tamarind_core::UserId;

/// Errors that can occur while minting a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The user id is not a valid UUID.
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    /// The configured secret cannot be used as a signing key.
    #[error(transparent)]
    Key(#[from] InvalidKey),
}

/// Mint a bearer token for `user_id` and print it to stdout.
///
/// # Errors
///
/// Returns an error if `AUTH_SECRET` is not set or `user_id` is not a valid
/// UUID.
pub fn mint(user_id: &str) -> Result<(), TokenError> {
    dotenvy::dotenv().ok();

    let secret = std::env::var("AUTH_SECRET")
        .map(SecretString::from)
        .map_err(|_| TokenError::MissingEnvVar("AUTH_SECRET"))?;

    let user: UserId = user_id
        .parse()
        .map_err(|_| TokenError::InvalidUserId(user_id.to_string()))?;

    let token = TokenService::new(secret).issue(user)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }

    Ok(())
}
