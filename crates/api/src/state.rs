//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::services::{CartService, CatalogService, CheckoutService, TokenService};
use crate::store::SharedStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// store handle, the domain services built on top of it, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: SharedStore,
    catalog: CatalogService,
    carts: CartService,
    checkouts: CheckoutService,
    tokens: TokenService,
}

impl AppState {
    /// Wire the service layer on top of a store handle.
    #[must_use]
    pub fn new(config: ApiConfig, store: SharedStore) -> Self {
        let catalog = CatalogService::new(Arc::clone(&store));
        let carts = CartService::new(Arc::clone(&store), catalog.clone());
        let checkouts = CheckoutService::new(Arc::clone(&store));
        let tokens = TokenService::new(config.auth_secret.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                catalog,
                carts,
                checkouts,
                tokens,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the backing store.
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    /// Get a reference to the product catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkouts(&self) -> &CheckoutService {
        &self.inner.checkouts
    }

    /// Get a reference to the bearer-token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }
}
