//! Admin management route handlers.
//!
//! Access is enforced per handler: every function here takes
//! `RequireAdmin` in its signature rather than relying on a router-level
//! layer.

pub mod orders;
pub mod products;
pub mod users;
