//! Cart mutations with optimistic-concurrency retries.
//!
//! Every mutation runs a read-modify-write loop against the store's
//! version counter. A lost race re-reads the cart and reapplies the
//! change, so two shoppers hammering the same cart never drop an item.

use tamarind_core::{GuestId, ProductId, UserId};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::{Cart, CartLineItem, CartOwner, LineItemKey};
use crate::services::CatalogService;
use crate::store::{CartStore, SharedStore, StoreError};

use super::CAS_RETRY_LIMIT;

fn cas_exhausted() -> AppError {
    AppError::Conflict("The cart was modified concurrently, please retry".to_string())
}

fn cart_not_found() -> AppError {
    AppError::NotFound("Cart not found".to_string())
}

fn owner_of(user: Option<UserId>, guest: Option<GuestId>) -> Option<CartOwner> {
    user.map(CartOwner::User).or(guest.map(CartOwner::Guest))
}

#[derive(Clone)]
pub struct CartService {
    store: SharedStore,
    catalog: CatalogService,
}

impl CartService {
    #[must_use]
    pub const fn new(store: SharedStore, catalog: CatalogService) -> Self {
        Self { store, catalog }
    }

    /// Add a product to the caller's cart, creating the cart if needed.
    ///
    /// A caller with neither a user nor a guest id gets a fresh guest
    /// identity; clients read it back from the returned cart's owner.
    /// Returns the cart and whether it was newly created.
    ///
    /// # Errors
    ///
    /// `Validation` for a non-positive quantity, `NotFound` for an
    /// unknown product, `Conflict` when retries are exhausted.
    #[instrument(skip(self, user, guest))]
    pub async fn add_item(
        &self,
        user: Option<UserId>,
        guest: Option<GuestId>,
        product_id: ProductId,
        quantity: i64,
        size: String,
        color: String,
    ) -> Result<(Cart, bool)> {
        if quantity < 1 {
            return Err(AppError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let product = self.catalog.find(product_id).await?;
        let owner =
            user.map(CartOwner::User)
                .unwrap_or_else(|| CartOwner::Guest(guest.unwrap_or_else(GuestId::generate)));

        for _ in 0..CAS_RETRY_LIMIT {
            match self.store.find_cart_by_owner(&owner).await? {
                Some(versioned) => {
                    let mut cart = versioned.doc;
                    cart.add_item(CartLineItem::snapshot(
                        &product,
                        size.clone(),
                        color.clone(),
                        quantity,
                    ));
                    match self.store.update_cart(&cart, versioned.version).await {
                        Ok(()) => return Ok((cart, false)),
                        Err(StoreError::VersionConflict) => {}
                        Err(e) => return Err(e.into()),
                    }
                }
                None => {
                    let mut cart = Cart::new(owner.clone());
                    cart.add_item(CartLineItem::snapshot(
                        &product,
                        size.clone(),
                        color.clone(),
                        quantity,
                    ));
                    match self.store.insert_cart(&cart).await {
                        Ok(()) => return Ok((cart, true)),
                        // Lost a create race for this owner; the next
                        // pass finds the winner's cart and updates it.
                        Err(StoreError::DuplicateKey(_)) => {}
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }
        Err(cas_exhausted())
    }

    /// Set the quantity of an existing cart line.
    ///
    /// A quantity of zero or less removes the line.
    ///
    /// # Errors
    ///
    /// `NotFound` when the cart or the line is missing, `Conflict` when
    /// retries are exhausted.
    #[instrument(skip(self, user, guest))]
    pub async fn update_quantity(
        &self,
        user: Option<UserId>,
        guest: Option<GuestId>,
        product_id: ProductId,
        quantity: i64,
        size: String,
        color: String,
    ) -> Result<Cart> {
        let owner = owner_of(user, guest).ok_or_else(cart_not_found)?;
        let key = LineItemKey {
            product_id,
            size,
            color,
        };
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);

        for _ in 0..CAS_RETRY_LIMIT {
            let Some(versioned) = self.store.find_cart_by_owner(&owner).await? else {
                return Err(cart_not_found());
            };
            let mut cart = versioned.doc;
            if !cart.set_quantity(&key, quantity) {
                return Err(AppError::NotFound("Product not found in cart".to_string()));
            }
            match self.store.update_cart(&cart, versioned.version).await {
                Ok(()) => return Ok(cart),
                Err(StoreError::VersionConflict) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Err(cas_exhausted())
    }

    /// Remove a cart line entirely.
    ///
    /// # Errors
    ///
    /// `NotFound` when the cart or the line is missing, `Conflict` when
    /// retries are exhausted.
    #[instrument(skip(self, user, guest))]
    pub async fn remove_item(
        &self,
        user: Option<UserId>,
        guest: Option<GuestId>,
        product_id: ProductId,
        size: String,
        color: String,
    ) -> Result<Cart> {
        let owner = owner_of(user, guest).ok_or_else(cart_not_found)?;
        let key = LineItemKey {
            product_id,
            size,
            color,
        };

        for _ in 0..CAS_RETRY_LIMIT {
            let Some(versioned) = self.store.find_cart_by_owner(&owner).await? else {
                return Err(cart_not_found());
            };
            let mut cart = versioned.doc;
            if !cart.remove_item(&key) {
                return Err(AppError::NotFound("Product not found in cart".to_string()));
            }
            match self.store.update_cart(&cart, versioned.version).await {
                Ok(()) => return Ok(cart),
                Err(StoreError::VersionConflict) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Err(cas_exhausted())
    }

    /// Resolve the caller's cart.
    ///
    /// # Errors
    ///
    /// `NotFound` when the caller has no cart.
    pub async fn fetch(&self, user: Option<UserId>, guest: Option<GuestId>) -> Result<Cart> {
        let owner = owner_of(user, guest).ok_or_else(cart_not_found)?;
        self.store
            .find_cart_by_owner(&owner)
            .await?
            .map(|v| v.doc)
            .ok_or_else(cart_not_found)
    }

    /// Fold a guest cart into the signed-in user's cart.
    ///
    /// Matching lines sum their quantities, the rest are appended, and
    /// the guest cart is deleted in the same store commit. A user with
    /// no cart of their own takes over the guest cart in place.
    ///
    /// # Errors
    ///
    /// `NotFound` when there is no guest cart and no user cart to fall
    /// back on, `Validation` for an empty guest cart, `Conflict` when
    /// retries are exhausted.
    #[instrument(skip(self, guest))]
    pub async fn merge(&self, user: UserId, guest: Option<GuestId>) -> Result<Cart> {
        let user_owner = CartOwner::User(user);

        for _ in 0..CAS_RETRY_LIMIT {
            let user_cart = self.store.find_cart_by_owner(&user_owner).await?;
            let Some(guest_id) = guest.as_ref() else {
                return user_cart
                    .map(|v| v.doc)
                    .ok_or_else(|| AppError::NotFound("Guest cart not found".to_string()));
            };
            let guest_owner = CartOwner::Guest(guest_id.clone());
            let Some(guest_cart) = self.store.find_cart_by_owner(&guest_owner).await? else {
                return user_cart
                    .map(|v| v.doc)
                    .ok_or_else(|| AppError::NotFound("Guest cart not found".to_string()));
            };
            if guest_cart.doc.is_empty() {
                return Err(AppError::Validation("Guest cart is empty".to_string()));
            }

            let attempt = match user_cart {
                Some(versioned) => {
                    let mut merged = versioned.doc;
                    merged.merge_from(guest_cart.doc);
                    self.store
                        .commit_merge(&merged, versioned.version, guest_id)
                        .await
                        .map(|()| merged)
                }
                None => {
                    let mut cart = guest_cart.doc;
                    cart.transfer_to_user(user);
                    self.store
                        .commit_merge(&cart, guest_cart.version, guest_id)
                        .await
                        .map(|()| cart)
                }
            };
            match attempt {
                Ok(cart) => return Ok(cart),
                Err(StoreError::VersionConflict) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Err(cas_exhausted())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
    use crate::models::ProductInput;
    use crate::store::MemoryStore;

    fn input(sku: &str, price: i64) -> ProductInput {
        ProductInput {
            name: format!("Product {sku}"),
            description: "desc".to_string(),
            price: Decimal::from(price),
            discount_price: None,
            count_in_stock: 10,
            sku: sku.to_string(),
            category: "Top Wear".to_string(),
            brand: None,
            sizes: vec!["S".to_string(), "M".to_string()],
            colors: vec!["red".to_string()],
            collections: "Basics".to_string(),
            material: None,
            gender: None,
            images: Vec::new(),
            is_featured: false,
            is_published: true,
            rating: 0.0,
            num_reviews: 0,
            tags: Vec::new(),
        }
    }

    struct Fixture {
        carts: CartService,
        catalog: CatalogService,
    }

    fn fixture() -> Fixture {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let catalog = CatalogService::new(Arc::clone(&store));
        let carts = CartService::new(store, catalog.clone());
        Fixture { carts, catalog }
    }

    async fn seeded_product(fx: &Fixture, sku: &str, price: i64) -> ProductId {
        fx.catalog
            .create(input(sku, price), UserId::generate())
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_add_without_identity_mints_a_guest_cart() {
        let fx = fixture();
        let product = seeded_product(&fx, "SKU-1", 10).await;

        let (cart, created) = fx
            .carts
            .add_item(None, None, product, 2, "M".to_string(), "red".to_string())
            .await
            .unwrap();

        assert!(created);
        assert!(cart.owner.as_guest().is_some());
        assert_eq!(cart.total_price, Decimal::from(20));

        // the minted identity resolves the same cart again
        let guest = cart.owner.as_guest().cloned();
        let (cart, created) = fx
            .carts
            .add_item(None, guest, product, 3, "M".to_string(), "red".to_string())
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(cart.products[0].quantity, 5);
        assert_eq!(cart.total_price, Decimal::from(50));
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive_quantity() {
        let fx = fixture();
        let product = seeded_product(&fx, "SKU-2", 10).await;

        let err = fx
            .carts
            .add_item(None, None, product, 0, "M".to_string(), "red".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let fx = fixture();
        let err = fx
            .carts
            .add_item(
                None,
                None,
                ProductId::generate(),
                1,
                "M".to_string(),
                "red".to_string(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_the_line() {
        let fx = fixture();
        let product = seeded_product(&fx, "SKU-3", 10).await;
        let user = UserId::generate();
        fx.carts
            .add_item(
                Some(user),
                None,
                product,
                2,
                "M".to_string(),
                "red".to_string(),
            )
            .await
            .unwrap();

        let cart = fx
            .carts
            .update_quantity(
                Some(user),
                None,
                product,
                0,
                "M".to_string(),
                "red".to_string(),
            )
            .await
            .unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_update_unknown_line_is_not_found() {
        let fx = fixture();
        let product = seeded_product(&fx, "SKU-4", 10).await;
        let user = UserId::generate();
        fx.carts
            .add_item(
                Some(user),
                None,
                product,
                1,
                "M".to_string(),
                "red".to_string(),
            )
            .await
            .unwrap();

        // same product, different size
        let err = fx
            .carts
            .update_quantity(
                Some(user),
                None,
                product,
                4,
                "S".to_string(),
                "red".to_string(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not found: Product not found in cart");
    }

    #[tokio::test]
    async fn test_fetch_without_identity_is_not_found() {
        let fx = fixture();
        let err = fx.carts.fetch(None, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_merge_transfers_a_guest_cart_in_place() {
        let fx = fixture();
        let product = seeded_product(&fx, "SKU-5", 10).await;
        let (guest_cart, _) = fx
            .carts
            .add_item(None, None, product, 2, "M".to_string(), "red".to_string())
            .await
            .unwrap();
        let guest = guest_cart.owner.as_guest().cloned();
        let user = UserId::generate();

        let merged = fx.carts.merge(user, guest.clone()).await.unwrap();

        assert_eq!(merged.id, guest_cart.id);
        assert_eq!(merged.owner.as_user(), Some(user));
        assert!(
            fx.carts
                .fetch(None, guest)
                .await
                .is_err_and(|e| matches!(e, AppError::NotFound(_)))
        );
    }

    #[tokio::test]
    async fn test_merge_sums_matching_lines_and_appends_the_rest() {
        let fx = fixture();
        let shirt = seeded_product(&fx, "SKU-6", 10).await;
        let hat = seeded_product(&fx, "SKU-7", 5).await;
        let user = UserId::generate();

        fx.carts
            .add_item(
                Some(user),
                None,
                shirt,
                2,
                "M".to_string(),
                "red".to_string(),
            )
            .await
            .unwrap();
        let (guest_cart, _) = fx
            .carts
            .add_item(None, None, shirt, 3, "M".to_string(), "red".to_string())
            .await
            .unwrap();
        let guest = guest_cart.owner.as_guest().cloned();
        fx.carts
            .add_item(None, guest.clone(), hat, 1, "M".to_string(), "red".to_string())
            .await
            .unwrap();

        let merged = fx.carts.merge(user, guest).await.unwrap();

        assert_eq!(merged.products.len(), 2);
        assert_eq!(merged.products[0].quantity, 5);
        assert_eq!(merged.total_price, Decimal::from(55));
    }

    #[tokio::test]
    async fn test_merge_without_guest_cart_returns_the_user_cart() {
        let fx = fixture();
        let product = seeded_product(&fx, "SKU-8", 10).await;
        let user = UserId::generate();
        fx.carts
            .add_item(
                Some(user),
                None,
                product,
                1,
                "M".to_string(),
                "red".to_string(),
            )
            .await
            .unwrap();

        let cart = fx.carts.merge(user, None).await.unwrap();
        assert_eq!(cart.owner.as_user(), Some(user));

        let err = fx.carts.merge(UserId::generate(), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Not found: Guest cart not found");
    }
}
