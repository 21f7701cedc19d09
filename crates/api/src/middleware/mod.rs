//! HTTP middleware for the API.
//!
//! Authentication is extractor-based rather than a layer: each route names
//! the access rule it needs (`RequireAuth`, `OptionalAuth`, `RequireAdmin`)
//! in its handler signature. The tracing and Sentry layers are applied on
//! the router in `app()`.

pub mod auth;

pub use auth::{OptionalAuth, Principal, RequireAdmin, RequireAuth};
