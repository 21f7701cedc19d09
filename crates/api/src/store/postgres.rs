//! `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `users` - id, unique email, doc
//! - `products` - id, unique sku, doc
//! - `carts` - id, owner columns (partial unique indexes), version, doc
//! - `checkouts` - id, version, doc
//! - `orders` - id, unique checkout_id, user_id, doc
//! - `subscribers` - unique email, doc
//!
//! Documents are the serialized models stored as JSONB; the extra columns
//! exist only for lookups, ordering, and uniqueness. Migrations live in
//! `crates/api/migrations/` and run via the cli `migrate` command.
//!
//! Every query runs under the configured store deadline; expiry surfaces as
//! [`StoreError::Timeout`] so the HTTP layer can answer 503 instead of
//! hanging.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use tamarind_core::{CheckoutId, Email, GuestId, OrderId, ProductId, UserId};

use crate::models::{Cart, CartOwner, CheckoutSession, Order, Product, Subscriber, User};
use crate::store::{
    CartStore, CheckoutStore, OrderStore, ProductStore, Store, StoreError, SubscriberStore,
    UserStore, Versioned,
};

/// Document store over a `PostgreSQL` connection pool.
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    /// Connect with sensible pool defaults.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the connection cannot be
    /// established.
    pub async fn connect(
        database_url: &SecretString,
        store_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url.expose_secret())
            .await?;
        Ok(Self {
            pool,
            timeout: store_timeout,
        })
    }

    /// Run the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(sqlx::Error::Migrate(Box::new(e))))
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}

fn unique_to_duplicate(err: sqlx::Error, key: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return StoreError::DuplicateKey(key.to_string());
    }
    StoreError::Database(err)
}

fn encode<T: Serialize>(doc: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(doc)
        .map_err(|e| StoreError::Corruption(format!("failed to encode document: {e}")))
}

fn decode<T: DeserializeOwned>(row: &PgRow) -> Result<T, StoreError> {
    let doc: serde_json::Value = row.try_get("doc")?;
    serde_json::from_value(doc)
        .map_err(|e| StoreError::Corruption(format!("invalid document in database: {e}")))
}

fn decode_versioned<T: DeserializeOwned>(row: &PgRow) -> Result<Versioned<T>, StoreError> {
    let version: i64 = row.try_get("version")?;
    Ok(Versioned {
        doc: decode(row)?,
        version,
    })
}

fn owner_columns(owner: &CartOwner) -> (Option<Uuid>, Option<&str>) {
    match owner {
        CartOwner::User(id) => (Some(id.as_uuid()), None),
        CartOwner::Guest(id) => (None, Some(id.as_str())),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let doc = encode(user)?;
        self.bounded(async {
            sqlx::query("INSERT INTO users (id, email, created_at, doc) VALUES ($1, $2, $3, $4)")
                .bind(user.id)
                .bind(user.email.as_str())
                .bind(user.created_at)
                .bind(&doc)
                .execute(&self.pool)
                .await
                .map_err(|e| unique_to_duplicate(e, "email"))?;
            Ok(())
        })
        .await
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.bounded(async {
            let row = sqlx::query("SELECT doc FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            row.as_ref().map(decode::<User>).transpose()
        })
        .await
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        self.bounded(async {
            let row = sqlx::query("SELECT doc FROM users WHERE email = $1")
                .bind(email.as_str())
                .fetch_optional(&self.pool)
                .await?;
            row.as_ref().map(decode::<User>).transpose()
        })
        .await
    }

    async fn update_user(&self, user: &User) -> Result<bool, StoreError> {
        let doc = encode(user)?;
        self.bounded(async {
            let result = sqlx::query("UPDATE users SET email = $2, doc = $3 WHERE id = $1")
                .bind(user.id)
                .bind(user.email.as_str())
                .bind(&doc)
                .execute(&self.pool)
                .await
                .map_err(|e| unique_to_duplicate(e, "email"))?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        self.bounded(async {
            let result = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.bounded(async {
            let rows = sqlx::query("SELECT doc FROM users ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;
            rows.iter().map(decode::<User>).collect()
        })
        .await
    }

    async fn clear_users(&self) -> Result<(), StoreError> {
        self.bounded(async {
            sqlx::query("DELETE FROM users").execute(&self.pool).await?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let doc = encode(product)?;
        self.bounded(async {
            sqlx::query(
                "INSERT INTO products (id, sku, created_at, doc) VALUES ($1, $2, $3, $4)",
            )
            .bind(product.id)
            .bind(&product.sku)
            .bind(product.created_at)
            .bind(&doc)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_to_duplicate(e, "sku"))?;
            Ok(())
        })
        .await
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.bounded(async {
            let row = sqlx::query("SELECT doc FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            row.as_ref().map(decode::<Product>).transpose()
        })
        .await
    }

    async fn update_product(&self, product: &Product) -> Result<bool, StoreError> {
        let doc = encode(product)?;
        self.bounded(async {
            let result = sqlx::query("UPDATE products SET sku = $2, doc = $3 WHERE id = $1")
                .bind(product.id)
                .bind(&product.sku)
                .bind(&doc)
                .execute(&self.pool)
                .await
                .map_err(|e| unique_to_duplicate(e, "sku"))?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        self.bounded(async {
            let result = sqlx::query("DELETE FROM products WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.bounded(async {
            let rows = sqlx::query("SELECT doc FROM products ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
            rows.iter().map(decode::<Product>).collect()
        })
        .await
    }

    async fn clear_products(&self) -> Result<(), StoreError> {
        self.bounded(async {
            sqlx::query("DELETE FROM products")
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn insert_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        let doc = encode(cart)?;
        let (owner_user, owner_guest) = owner_columns(&cart.owner);
        self.bounded(async {
            sqlx::query(
                "INSERT INTO carts (id, owner_user, owner_guest, version, doc) \
                 VALUES ($1, $2, $3, 1, $4)",
            )
            .bind(cart.id)
            .bind(owner_user)
            .bind(owner_guest)
            .bind(&doc)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_to_duplicate(e, "cart owner"))?;
            Ok(())
        })
        .await
    }

    async fn find_cart_by_owner(
        &self,
        owner: &CartOwner,
    ) -> Result<Option<Versioned<Cart>>, StoreError> {
        let (owner_user, owner_guest) = owner_columns(owner);
        self.bounded(async {
            let row = sqlx::query(
                "SELECT version, doc FROM carts WHERE owner_user = $1 OR owner_guest = $2",
            )
            .bind(owner_user)
            .bind(owner_guest)
            .fetch_optional(&self.pool)
            .await?;
            row.as_ref().map(decode_versioned::<Cart>).transpose()
        })
        .await
    }

    async fn update_cart(&self, cart: &Cart, expected_version: i64) -> Result<(), StoreError> {
        let doc = encode(cart)?;
        let (owner_user, owner_guest) = owner_columns(&cart.owner);
        self.bounded(async {
            let result = sqlx::query(
                "UPDATE carts SET doc = $1, owner_user = $2, owner_guest = $3, \
                 version = version + 1 WHERE id = $4 AND version = $5",
            )
            .bind(&doc)
            .bind(owner_user)
            .bind(owner_guest)
            .bind(cart.id)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::VersionConflict);
            }
            Ok(())
        })
        .await
    }

    async fn delete_cart_by_owner(&self, owner: &CartOwner) -> Result<bool, StoreError> {
        let (owner_user, owner_guest) = owner_columns(owner);
        self.bounded(async {
            let result =
                sqlx::query("DELETE FROM carts WHERE owner_user = $1 OR owner_guest = $2")
                    .bind(owner_user)
                    .bind(owner_guest)
                    .execute(&self.pool)
                    .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn commit_merge(
        &self,
        merged: &Cart,
        expected_version: i64,
        guest: &GuestId,
    ) -> Result<(), StoreError> {
        let doc = encode(merged)?;
        let (owner_user, owner_guest) = owner_columns(&merged.owner);
        self.bounded(async {
            let mut tx = self.pool.begin().await?;
            let result = sqlx::query(
                "UPDATE carts SET doc = $1, owner_user = $2, owner_guest = $3, \
                 version = version + 1 WHERE id = $4 AND version = $5",
            )
            .bind(&doc)
            .bind(owner_user)
            .bind(owner_guest)
            .bind(merged.id)
            .bind(expected_version)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 0 {
                // dropping the tx rolls it back
                return Err(StoreError::VersionConflict);
            }
            sqlx::query("DELETE FROM carts WHERE owner_guest = $1")
                .bind(guest.as_str())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl CheckoutStore for PgStore {
    async fn insert_checkout(&self, session: &CheckoutSession) -> Result<(), StoreError> {
        let doc = encode(session)?;
        self.bounded(async {
            sqlx::query("INSERT INTO checkouts (id, version, doc) VALUES ($1, 1, $2)")
                .bind(session.id)
                .bind(&doc)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    async fn find_checkout(
        &self,
        id: CheckoutId,
    ) -> Result<Option<Versioned<CheckoutSession>>, StoreError> {
        self.bounded(async {
            let row = sqlx::query("SELECT version, doc FROM checkouts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            row.as_ref()
                .map(decode_versioned::<CheckoutSession>)
                .transpose()
        })
        .await
    }

    async fn update_checkout(
        &self,
        session: &CheckoutSession,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let doc = encode(session)?;
        self.bounded(async {
            let result = sqlx::query(
                "UPDATE checkouts SET doc = $1, version = version + 1 \
                 WHERE id = $2 AND version = $3",
            )
            .bind(&doc)
            .bind(session.id)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::VersionConflict);
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let doc = encode(order)?;
        self.bounded(async {
            sqlx::query(
                "INSERT INTO orders (id, checkout_id, user_id, created_at, doc) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order.id)
            .bind(order.checkout_id)
            .bind(order.user)
            .bind(order.created_at)
            .bind(&doc)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_to_duplicate(e, "checkout_id"))?;
            Ok(())
        })
        .await
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.bounded(async {
            let row = sqlx::query("SELECT doc FROM orders WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            row.as_ref().map(decode::<Order>).transpose()
        })
        .await
    }

    async fn find_order_by_checkout(
        &self,
        checkout_id: CheckoutId,
    ) -> Result<Option<Order>, StoreError> {
        self.bounded(async {
            let row = sqlx::query("SELECT doc FROM orders WHERE checkout_id = $1")
                .bind(checkout_id)
                .fetch_optional(&self.pool)
                .await?;
            row.as_ref().map(decode::<Order>).transpose()
        })
        .await
    }

    async fn list_orders_for_user(&self, user: UserId) -> Result<Vec<Order>, StoreError> {
        self.bounded(async {
            let rows =
                sqlx::query("SELECT doc FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
                    .bind(user)
                    .fetch_all(&self.pool)
                    .await?;
            rows.iter().map(decode::<Order>).collect()
        })
        .await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        self.bounded(async {
            let rows = sqlx::query("SELECT doc FROM orders ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
            rows.iter().map(decode::<Order>).collect()
        })
        .await
    }

    async fn update_order(&self, order: &Order) -> Result<bool, StoreError> {
        let doc = encode(order)?;
        self.bounded(async {
            let result = sqlx::query("UPDATE orders SET doc = $1 WHERE id = $2")
                .bind(&doc)
                .bind(order.id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError> {
        self.bounded(async {
            let result = sqlx::query("DELETE FROM orders WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}

#[async_trait]
impl SubscriberStore for PgStore {
    async fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<(), StoreError> {
        let doc = encode(subscriber)?;
        self.bounded(async {
            sqlx::query("INSERT INTO subscribers (email, doc) VALUES ($1, $2)")
                .bind(subscriber.email.as_str())
                .bind(&doc)
                .execute(&self.pool)
                .await
                .map_err(|e| unique_to_duplicate(e, "email"))?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        })
        .await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
