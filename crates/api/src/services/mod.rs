//! Domain services sitting between the routes and the store.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod tokens;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use tokens::TokenService;

/// Attempt budget for optimistic-concurrency write loops.
pub(crate) const CAS_RETRY_LIMIT: u32 = 5;
