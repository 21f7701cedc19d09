//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! tamarind-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use tracing::info;

use tamarind_api::store::{PgStore, Store, StoreError};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Apply all pending migrations to the API database.
///
/// # Errors
///
/// Returns an error if the database URL is not configured or a migration
/// fails.
pub async fn run() -> Result<(), MigrateError> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;

    info!("Connecting to database");
    let store = PgStore::connect(&database_url, Duration::from_secs(5)).await?;

    info!("Running migrations");
    store.migrate().await?;
    store.close().await;

    info!("Migrations complete");
    Ok(())
}

fn database_url() -> Result<SecretString, MigrateError> {
    std::env::var("API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrateError::MissingEnvVar("API_DATABASE_URL"))
}
