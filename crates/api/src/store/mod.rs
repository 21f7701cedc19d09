//! Persistence layer.
//!
//! Every collection is stored as a document (the serialized model) plus the
//! handful of columns the store needs for lookups and uniqueness: owner ids
//! for carts, `email` for users and subscribers, `sku` for products,
//! `checkout_id` for orders. Carts and checkout sessions additionally carry
//! a `version` counter for optimistic concurrency; callers that read a
//! [`Versioned`] document must pass the version back on update and handle
//! [`StoreError::VersionConflict`].
//!
//! Two implementations:
//!
//! - [`MemoryStore`] - process-local, for tests and local development
//! - [`PgStore`] - `PostgreSQL` via sqlx, documents as JSONB
//!
//! The handle is constructed once at startup, injected into application
//! state as a [`SharedStore`], and closed on shutdown.

use std::sync::Arc;

use async_trait::async_trait;
use tamarind_core::{CheckoutId, Email, GuestId, OrderId, ProductId, UserId};
use thiserror::Error;

use crate::models::{Cart, CartOwner, CheckoutSession, Order, Product, Subscriber, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document could not be decoded.
    #[error("data corruption: {0}")]
    Corruption(String),

    /// Optimistic concurrency check failed; reload and retry.
    #[error("document was modified concurrently")]
    VersionConflict,

    /// A unique key was violated. Carries the key's name.
    #[error("duplicate value for {0}")]
    DuplicateKey(String),

    /// The operation did not complete within the store deadline.
    #[error("store operation timed out")]
    Timeout,
}

/// A document together with its optimistic-concurrency version.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub doc: T,
    pub version: i64,
}

/// User collection operations.
#[async_trait]
pub trait UserStore {
    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey("email")` if the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError>;

    /// Replace a stored user. Returns `false` if no such user exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey("email")` if the new email collides
    /// with another user.
    async fn update_user(&self, user: &User) -> Result<bool, StoreError>;

    /// Delete a user. Returns `false` if no such user exists.
    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError>;

    /// All users, oldest first.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Remove every user. Seeding only.
    async fn clear_users(&self) -> Result<(), StoreError>;
}

/// Product collection operations.
#[async_trait]
pub trait ProductStore {
    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey("sku")` if the sku is taken.
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Replace a stored product. Returns `false` if no such product exists.
    async fn update_product(&self, product: &Product) -> Result<bool, StoreError>;

    /// Delete a product. Returns `false` if no such product exists.
    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError>;

    /// All products (published or not), newest first.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Remove every product. Seeding only.
    async fn clear_products(&self) -> Result<(), StoreError>;
}

/// Cart collection operations.
///
/// Carts are looked up by owner, never by id: ownership is unique, enforced
/// by the store.
#[async_trait]
pub trait CartStore {
    /// Insert a new cart at version 1.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey("cart owner")` if the owner already
    /// has a cart (a concurrent first-add lost the race; reload and retry).
    async fn insert_cart(&self, cart: &Cart) -> Result<(), StoreError>;

    async fn find_cart_by_owner(
        &self,
        owner: &CartOwner,
    ) -> Result<Option<Versioned<Cart>>, StoreError>;

    /// Compare-and-swap replace of a cart document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::VersionConflict` if the stored version is not
    /// `expected_version` (or the cart is gone).
    async fn update_cart(&self, cart: &Cart, expected_version: i64) -> Result<(), StoreError>;

    /// Delete the cart owned by `owner`. Returns `false` if there was none.
    async fn delete_cart_by_owner(&self, owner: &CartOwner) -> Result<bool, StoreError>;

    /// Atomically commit a guest-to-user merge: CAS-replace `merged` (which
    /// may be the guest's own document reassigned to the user) and delete
    /// whatever cart still belongs to `guest`. Callers observe either the
    /// whole merge or none of it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::VersionConflict` if the CAS fails; nothing is
    /// deleted in that case.
    async fn commit_merge(
        &self,
        merged: &Cart,
        expected_version: i64,
        guest: &GuestId,
    ) -> Result<(), StoreError>;
}

/// Checkout session collection operations.
#[async_trait]
pub trait CheckoutStore {
    async fn insert_checkout(&self, session: &CheckoutSession) -> Result<(), StoreError>;

    async fn find_checkout(
        &self,
        id: CheckoutId,
    ) -> Result<Option<Versioned<CheckoutSession>>, StoreError>;

    /// Compare-and-swap replace of a session document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::VersionConflict` if the stored version is not
    /// `expected_version`.
    async fn update_checkout(
        &self,
        session: &CheckoutSession,
        expected_version: i64,
    ) -> Result<(), StoreError>;
}

/// Order collection operations.
#[async_trait]
pub trait OrderStore {
    /// Insert a new order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey("checkout_id")` if an order for the
    /// same checkout session already exists. This is the exactly-once guard
    /// for finalization.
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn find_order_by_checkout(
        &self,
        checkout_id: CheckoutId,
    ) -> Result<Option<Order>, StoreError>;

    /// Orders placed by `user`, newest first.
    async fn list_orders_for_user(&self, user: UserId) -> Result<Vec<Order>, StoreError>;

    /// All orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// Replace a stored order. Returns `false` if no such order exists.
    async fn update_order(&self, order: &Order) -> Result<bool, StoreError>;

    /// Delete an order. Returns `false` if no such order exists.
    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError>;
}

/// Newsletter subscriber operations.
#[async_trait]
pub trait SubscriberStore {
    /// Insert a subscriber.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey("email")` if the email is already
    /// subscribed.
    async fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<(), StoreError>;
}

/// The full store surface plus lifecycle.
#[async_trait]
pub trait Store:
    UserStore
    + ProductStore
    + CartStore
    + CheckoutStore
    + OrderStore
    + SubscriberStore
    + Send
    + Sync
{
    /// Cheap liveness probe for the readiness endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release connections. Called once on shutdown.
    async fn close(&self);
}

/// Shared handle to the store, injected into application state.
pub type SharedStore = Arc<dyn Store>;
