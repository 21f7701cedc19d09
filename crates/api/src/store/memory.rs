//! Process-local store over `HashMap`s.
//!
//! Backs tests and local development. Uniqueness and versioning follow the
//! same rules as the Postgres implementation so services behave identically
//! over either backend. Guards are held only for the duration of each
//! synchronous operation, never across an await point.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tamarind_core::{CartId, CheckoutId, Email, GuestId, OrderId, ProductId, UserId};

use crate::models::{Cart, CartOwner, CheckoutSession, Order, Product, Subscriber, User};
use crate::store::{
    CartStore, CheckoutStore, OrderStore, ProductStore, Store, StoreError, SubscriberStore,
    UserStore, Versioned,
};

#[derive(Default)]
struct Collections {
    users: HashMap<UserId, User>,
    products: HashMap<ProductId, Product>,
    carts: HashMap<CartId, Versioned<Cart>>,
    checkouts: HashMap<CheckoutId, Versioned<CheckoutSession>>,
    orders: HashMap<OrderId, Order>,
    subscribers: HashMap<String, Subscriber>,
}

/// In-memory document store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.write();
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateKey("email".to_string()));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.email == *email)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<bool, StoreError> {
        let mut inner = self.write();
        if !inner.users.contains_key(&user.id) {
            return Ok(false);
        }
        if inner
            .users
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(StoreError::DuplicateKey("email".to_string()));
        }
        inner.users.insert(user.id, user.clone());
        Ok(true)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self.write().users.remove(&id).is_some())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.read().users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn clear_users(&self) -> Result<(), StoreError> {
        self.write().users.clear();
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut inner = self.write();
        if inner.products.values().any(|p| p.sku == product.sku) {
            return Err(StoreError::DuplicateKey("sku".to_string()));
        }
        inner.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read().products.get(&id).cloned())
    }

    async fn update_product(&self, product: &Product) -> Result<bool, StoreError> {
        let mut inner = self.write();
        if !inner.products.contains_key(&product.id) {
            return Ok(false);
        }
        if inner
            .products
            .values()
            .any(|p| p.sku == product.sku && p.id != product.id)
        {
            return Err(StoreError::DuplicateKey("sku".to_string()));
        }
        inner.products.insert(product.id, product.clone());
        Ok(true)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        Ok(self.write().products.remove(&id).is_some())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self.read().products.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn clear_products(&self) -> Result<(), StoreError> {
        self.write().products.clear();
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn insert_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        let mut inner = self.write();
        if inner.carts.values().any(|c| c.doc.owner == cart.owner) {
            return Err(StoreError::DuplicateKey("cart owner".to_string()));
        }
        inner.carts.insert(
            cart.id,
            Versioned {
                doc: cart.clone(),
                version: 1,
            },
        );
        Ok(())
    }

    async fn find_cart_by_owner(
        &self,
        owner: &CartOwner,
    ) -> Result<Option<Versioned<Cart>>, StoreError> {
        Ok(self
            .read()
            .carts
            .values()
            .find(|c| c.doc.owner == *owner)
            .cloned())
    }

    async fn update_cart(&self, cart: &Cart, expected_version: i64) -> Result<(), StoreError> {
        let mut inner = self.write();
        let Some(entry) = inner.carts.get_mut(&cart.id) else {
            return Err(StoreError::VersionConflict);
        };
        if entry.version != expected_version {
            return Err(StoreError::VersionConflict);
        }
        entry.doc = cart.clone();
        entry.version += 1;
        Ok(())
    }

    async fn delete_cart_by_owner(&self, owner: &CartOwner) -> Result<bool, StoreError> {
        let mut inner = self.write();
        let id = inner
            .carts
            .values()
            .find(|c| c.doc.owner == *owner)
            .map(|c| c.doc.id);
        match id {
            Some(id) => {
                inner.carts.remove(&id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit_merge(
        &self,
        merged: &Cart,
        expected_version: i64,
        guest: &GuestId,
    ) -> Result<(), StoreError> {
        let mut inner = self.write();
        {
            let Some(entry) = inner.carts.get_mut(&merged.id) else {
                return Err(StoreError::VersionConflict);
            };
            if entry.version != expected_version {
                return Err(StoreError::VersionConflict);
            }
            entry.doc = merged.clone();
            entry.version += 1;
        }
        let guest_owner = CartOwner::Guest(guest.clone());
        let stale = inner
            .carts
            .values()
            .find(|c| c.doc.owner == guest_owner)
            .map(|c| c.doc.id);
        if let Some(id) = stale {
            inner.carts.remove(&id);
        }
        Ok(())
    }
}

#[async_trait]
impl CheckoutStore for MemoryStore {
    async fn insert_checkout(&self, session: &CheckoutSession) -> Result<(), StoreError> {
        self.write().checkouts.insert(
            session.id,
            Versioned {
                doc: session.clone(),
                version: 1,
            },
        );
        Ok(())
    }

    async fn find_checkout(
        &self,
        id: CheckoutId,
    ) -> Result<Option<Versioned<CheckoutSession>>, StoreError> {
        Ok(self.read().checkouts.get(&id).cloned())
    }

    async fn update_checkout(
        &self,
        session: &CheckoutSession,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.write();
        let Some(entry) = inner.checkouts.get_mut(&session.id) else {
            return Err(StoreError::VersionConflict);
        };
        if entry.version != expected_version {
            return Err(StoreError::VersionConflict);
        }
        entry.doc = session.clone();
        entry.version += 1;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut inner = self.write();
        if inner
            .orders
            .values()
            .any(|o| o.checkout_id == order.checkout_id)
        {
            return Err(StoreError::DuplicateKey("checkout_id".to_string()));
        }
        inner.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.read().orders.get(&id).cloned())
    }

    async fn find_order_by_checkout(
        &self,
        checkout_id: CheckoutId,
    ) -> Result<Option<Order>, StoreError> {
        Ok(self
            .read()
            .orders
            .values()
            .find(|o| o.checkout_id == checkout_id)
            .cloned())
    }

    async fn list_orders_for_user(&self, user: UserId) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .read()
            .orders
            .values()
            .filter(|o| o.user == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self.read().orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order(&self, order: &Order) -> Result<bool, StoreError> {
        let mut inner = self.write();
        if !inner.orders.contains_key(&order.id) {
            return Ok(false);
        }
        inner.orders.insert(order.id, order.clone());
        Ok(true)
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError> {
        Ok(self.write().orders.remove(&id).is_some())
    }
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<(), StoreError> {
        let mut inner = self.write();
        let key = subscriber.email.as_str().to_string();
        if inner.subscribers.contains_key(&key) {
            return Err(StoreError::DuplicateKey("email".to_string()));
        }
        inner.subscribers.insert(key, subscriber.clone());
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}
}
