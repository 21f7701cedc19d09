//! Product catalog behind an in-memory cache.

use std::time::Duration;

use moka::future::Cache;
use tamarind_core::{ProductId, UserId};
use tracing::{debug, instrument};

use crate::error::{AppError, Result};
use crate::models::{Product, ProductInput, ProductPatch};
use crate::store::{ProductStore, SharedStore};

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Catalog reads and admin catalog mutations.
///
/// Reads go through a bounded five-minute cache. Mutations write to the
/// store first and invalidate the cached entry afterwards, so a cart
/// snapshot taken after an admin edit sees the edited product.
#[derive(Clone)]
pub struct CatalogService {
    store: SharedStore,
    cache: Cache<ProductId, Product>,
}

impl CatalogService {
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();
        Self { store, cache }
    }

    /// Resolve a product by id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no such product exists.
    pub async fn find(&self, id: ProductId) -> Result<Product> {
        if let Some(product) = self.cache.get(&id).await {
            debug!(%id, "catalog cache hit");
            return Ok(product);
        }
        let product = self
            .store
            .find_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
        self.cache.insert(id, product.clone()).await;
        Ok(product)
    }

    /// Published products, newest first.
    pub async fn list_published(&self) -> Result<Vec<Product>> {
        let products = self.store.list_products().await?;
        Ok(products.into_iter().filter(|p| p.is_published).collect())
    }

    /// Every product, including unpublished ones.
    pub async fn list_all(&self) -> Result<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    /// Create a product attributed to `created_by`.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: ProductInput, created_by: UserId) -> Result<Product> {
        input.validate().map_err(AppError::Validation)?;
        let product = Product::new(input, created_by);
        self.store.insert_product(&product).await?;
        Ok(product)
    }

    /// Apply a partial update to a product.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        patch.validate().map_err(AppError::Validation)?;
        let mut product = self
            .store
            .find_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
        product.apply(patch);
        if !self.store.update_product(&product).await? {
            return Err(AppError::NotFound("Product not found".to_string()));
        }
        self.cache.invalidate(&id).await;
        Ok(product)
    }

    /// Delete a product.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<()> {
        if !self.store.delete_product(id).await? {
            return Err(AppError::NotFound("Product not found".to_string()));
        }
        self.cache.invalidate(&id).await;
        Ok(())
    }
}
