//! Tamarind Core - Shared domain types.
//!
//! This crate provides common types used across all Tamarind components:
//! - `api` - The HTTP server (catalog, carts, checkout, orders, admin)
//! - `cli` - Command-line tools for migrations, seeding, and token minting
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
