//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! # Cart (anonymous callers pass a guest_id)
//! GET    /api/cart                    - Fetch the caller's cart
//! POST   /api/cart                    - Add an item (201 when the cart is created)
//! PUT    /api/cart                    - Set a line quantity (<= 0 removes)
//! DELETE /api/cart                    - Remove a line
//! POST   /api/cart/merge              - Merge guest cart into user cart
//!
//! # Checkout
//! POST   /api/checkout                - Open a session from a cart snapshot
//! PUT    /api/checkout/{id}/pay       - Record a payment
//! POST   /api/checkout/{id}/finalize  - Materialize the order (201)
//!
//! # Orders
//! GET    /api/orders/my-orders        - Caller's orders, newest first
//! GET    /api/orders/{id}             - Order detail (owner or admin)
//!
//! # Catalog
//! GET    /api/products                - Published products
//! GET    /api/products/{id}           - Product detail
//!
//! # Newsletter
//! POST   /api/subscribe               - Subscribe an email address
//!
//! # Admin (requires role = admin)
//! GET    /api/admin/users             - List users
//! POST   /api/admin/users             - Create a user
//! PUT    /api/admin/users/{id}        - Partial user update
//! DELETE /api/admin/users/{id}        - Delete a user
//! GET    /api/admin/products          - All products, including unpublished
//! POST   /api/admin/products          - Create a product
//! PUT    /api/admin/products/{id}     - Partial product update
//! DELETE /api/admin/products/{id}     - Delete a product
//! GET    /api/admin/orders            - List all orders
//! PUT    /api/admin/orders/{id}       - Update fulfillment status
//! DELETE /api/admin/orders/{id}       - Delete an order
//! ```

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod newsletter;
pub mod orders;
pub mod products;

use axum::Router;
use axum::routing::{get, post, put};
use serde::Serialize;

use crate::state::AppState;

/// Plain `{"message": ...}` body for operations with nothing else to say.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(cart::show)
                .post(cart::add)
                .put(cart::update)
                .delete(cart::remove),
        )
        .route("/merge", post(cart::merge))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::create))
        .route("/{id}/pay", put(checkout::pay))
        .route("/{id}/finalize", post(checkout::finalize))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/my-orders", get(orders::my_orders))
        .route("/{id}", get(orders::show))
}

/// Create the public catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the admin management router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(admin::users::index).post(admin::users::create),
        )
        .route(
            "/users/{id}",
            put(admin::users::update).delete(admin::users::remove),
        )
        .route(
            "/products",
            get(admin::products::index).post(admin::products::create),
        )
        .route(
            "/products/{id}",
            put(admin::products::update).delete(admin::products::remove),
        )
        .route("/orders", get(admin::orders::index))
        .route(
            "/orders/{id}",
            put(admin::orders::update_status).delete(admin::orders::remove),
        )
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Cart routes
        .nest("/api/cart", cart_routes())
        // Checkout routes
        .nest("/api/checkout", checkout_routes())
        // Order routes
        .nest("/api/orders", order_routes())
        // Public catalog
        .nest("/api/products", product_routes())
        // Newsletter signup
        .route("/api/subscribe", post(newsletter::subscribe))
        // Admin management surface
        .nest("/api/admin", admin_routes())
}
