//! Checkout session lifecycle: create, record payment, finalize.
//!
//! Finalization is the only path that creates orders. It is guarded twice:
//! a compare-and-swap flip of `is_finalized` on the session and a unique
//! `checkout_id` on the orders collection, so a crash or a concurrent call
//! can never materialize a second order for the same session.

use rust_decimal::Decimal;
use tamarind_core::{CheckoutId, UserId};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::Principal;
use crate::models::{CartOwner, CheckoutItem, CheckoutSession, Order, ShippingAddress};
use crate::store::{CartStore, CheckoutStore, OrderStore, SharedStore, StoreError};

use super::CAS_RETRY_LIMIT;

fn checkout_not_found() -> AppError {
    AppError::NotFound("Checkout not found".to_string())
}

fn cas_exhausted() -> AppError {
    AppError::Conflict("The checkout was modified concurrently, please retry".to_string())
}

/// Only the session owner or an admin may touch a session.
fn authorize(session: &CheckoutSession, caller: &Principal) -> Result<()> {
    if session.user == caller.id || caller.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to access this checkout".to_string(),
        ))
    }
}

#[derive(Clone)]
pub struct CheckoutService {
    store: SharedStore,
}

impl CheckoutService {
    #[must_use]
    pub const fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Open a pending session from a caller-supplied snapshot.
    ///
    /// The cart is not consulted and not modified here; it survives until
    /// the session is finalized.
    ///
    /// # Errors
    ///
    /// `Validation` when `checkout_items` is empty.
    #[instrument(skip_all, fields(%user))]
    pub async fn create(
        &self,
        user: UserId,
        checkout_items: Vec<CheckoutItem>,
        shipping_address: ShippingAddress,
        payment_method: String,
        total_price: Decimal,
    ) -> Result<CheckoutSession> {
        if checkout_items.is_empty() {
            return Err(AppError::Validation("No items in checkout".to_string()));
        }
        let session = CheckoutSession::new(
            user,
            checkout_items,
            shipping_address,
            payment_method,
            total_price,
        );
        self.store.insert_checkout(&session).await?;
        Ok(session)
    }

    /// Record a payment reported by the external gateway flow.
    ///
    /// Only the literal status `"paid"` is accepted. There is no
    /// already-paid guard; a repeated report re-stamps the same fields.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown session, `Forbidden` for a caller who is
    /// neither the owner nor an admin, `Validation` for any status other
    /// than `"paid"`.
    #[instrument(skip(self, caller, payment_details))]
    pub async fn pay(
        &self,
        caller: &Principal,
        id: CheckoutId,
        payment_status: &str,
        payment_details: Option<serde_json::Value>,
    ) -> Result<CheckoutSession> {
        for _ in 0..CAS_RETRY_LIMIT {
            let Some(versioned) = self.store.find_checkout(id).await? else {
                return Err(checkout_not_found());
            };
            authorize(&versioned.doc, caller)?;
            if payment_status != "paid" {
                return Err(AppError::Validation("Invalid payment status".to_string()));
            }
            let mut session = versioned.doc;
            session.mark_paid(payment_details.clone());
            match self.store.update_checkout(&session, versioned.version).await {
                Ok(()) => return Ok(session),
                Err(StoreError::VersionConflict) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Err(cas_exhausted())
    }

    /// Turn a paid session into an order, exactly once.
    ///
    /// Inserts the order first, then flips `is_finalized` with a
    /// conditional update, then deletes the caller's cart. A retry after a
    /// crash between those steps resolves the already-created order by its
    /// `checkout_id` and completes the remaining steps; a concurrent loser
    /// reloads the flipped session and reports Conflict.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown session, `Forbidden` for a caller who is
    /// neither the owner nor an admin, `Conflict` when the session is
    /// already finalized, `Validation` when it is not paid yet.
    #[instrument(skip(self, caller))]
    pub async fn finalize(&self, caller: &Principal, id: CheckoutId) -> Result<Order> {
        for _ in 0..CAS_RETRY_LIMIT {
            let Some(versioned) = self.store.find_checkout(id).await? else {
                return Err(checkout_not_found());
            };
            authorize(&versioned.doc, caller)?;
            if versioned.doc.is_finalized {
                return Err(AppError::Conflict(
                    "Checkout has already been finalized".to_string(),
                ));
            }
            if !versioned.doc.is_paid {
                return Err(AppError::Validation("Checkout is not paid yet".to_string()));
            }

            let order = match self.store.find_order_by_checkout(id).await? {
                // an earlier attempt crashed after the insert
                Some(existing) => existing,
                None => {
                    let order = Order::from_session(&versioned.doc);
                    match self.store.insert_order(&order).await {
                        Ok(()) => order,
                        // lost the insert race; the next pass picks up
                        // the winner's order or the flipped session
                        Err(StoreError::DuplicateKey(_)) => continue,
                        Err(e) => return Err(e.into()),
                    }
                }
            };

            let mut session = versioned.doc;
            session.mark_finalized();
            match self.store.update_checkout(&session, versioned.version).await {
                Ok(()) => {
                    self.store
                        .delete_cart_by_owner(&CartOwner::User(session.user))
                        .await?;
                    return Ok(order);
                }
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

    use serde_json::json;
    use tamarind_core::{Email, OrderStatus, PaymentStatus, ProductId, Role};

    use super::*;
    use crate::models::Cart;
    use crate::store::MemoryStore;

    fn principal(id: UserId, role: Role) -> Principal {
        Principal {
            id,
            name: "Test User".to_string(),
            email: Email::parse("test@example.com").unwrap(),
            role,
        }
    }

    fn item(price: i64, quantity: u32) -> CheckoutItem {
        CheckoutItem {
            product_id: ProductId::generate(),
            name: "Classic Tee".to_string(),
            image: None,
            price: Decimal::from(price),
            color: "red".to_string(),
            size: "M".to_string(),
            quantity,
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "USA".to_string(),
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        checkouts: CheckoutService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let checkouts = CheckoutService::new(Arc::clone(&store) as SharedStore);
        Fixture { store, checkouts }
    }

    async fn paid_session(fx: &Fixture, owner: &Principal) -> CheckoutSession {
        let session = fx
            .checkouts
            .create(
                owner.id,
                vec![item(50, 2)],
                address(),
                "PayPal".to_string(),
                Decimal::from(100),
            )
            .await
            .unwrap();
        fx.checkouts
            .pay(owner, session.id, "paid", Some(json!({"txn": "abc123"})))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_an_empty_item_list() {
        let fx = fixture();
        let err = fx
            .checkouts
            .create(
                UserId::generate(),
                Vec::new(),
                address(),
                "PayPal".to_string(),
                Decimal::ZERO,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: No items in checkout");
    }

    #[tokio::test]
    async fn test_pay_accepts_only_the_literal_paid() {
        let fx = fixture();
        let owner = principal(UserId::generate(), Role::Customer);
        let session = fx
            .checkouts
            .create(
                owner.id,
                vec![item(10, 1)],
                address(),
                "PayPal".to_string(),
                Decimal::from(10),
            )
            .await
            .unwrap();

        let err = fx
            .checkouts
            .pay(&owner, session.id, "PAID", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Invalid payment status");

        let paid = fx
            .checkouts
            .pay(&owner, session.id, "paid", Some(json!({"txn": "t-1"})))
            .await
            .unwrap();
        assert!(paid.is_paid);
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert!(paid.paid_at.is_some());
        assert_eq!(paid.payment_details, Some(json!({"txn": "t-1"})));
    }

    #[tokio::test]
    async fn test_pay_unknown_session_is_not_found_even_with_a_bad_status() {
        let fx = fixture();
        let owner = principal(UserId::generate(), Role::Customer);
        let err = fx
            .checkouts
            .pay(&owner, CheckoutId::generate(), "declined", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_pay_requires_the_owner_or_an_admin() {
        let fx = fixture();
        let owner = principal(UserId::generate(), Role::Customer);
        let session = fx
            .checkouts
            .create(
                owner.id,
                vec![item(10, 1)],
                address(),
                "PayPal".to_string(),
                Decimal::from(10),
            )
            .await
            .unwrap();

        let stranger = principal(UserId::generate(), Role::Customer);
        let err = fx
            .checkouts
            .pay(&stranger, session.id, "paid", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let admin = principal(UserId::generate(), Role::Admin);
        assert!(fx.checkouts.pay(&admin, session.id, "paid", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_finalize_requires_payment_first() {
        let fx = fixture();
        let owner = principal(UserId::generate(), Role::Customer);
        let session = fx
            .checkouts
            .create(
                owner.id,
                vec![item(10, 1)],
                address(),
                "PayPal".to_string(),
                Decimal::from(10),
            )
            .await
            .unwrap();

        let err = fx.checkouts.finalize(&owner, session.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Checkout is not paid yet");
        assert!(fx.store.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_finalize_materializes_the_order_and_clears_the_cart() {
        let fx = fixture();
        let owner = principal(UserId::generate(), Role::Customer);
        let cart = Cart::new(CartOwner::User(owner.id));
        fx.store.insert_cart(&cart).await.unwrap();
        let session = paid_session(&fx, &owner).await;

        let order = fx.checkouts.finalize(&owner, session.id).await.unwrap();

        assert_eq!(order.checkout_id, session.id);
        assert_eq!(order.user, owner.id);
        assert_eq!(order.total_price, Decimal::from(100));
        assert_eq!(order.order_items.len(), 1);
        assert!(order.is_paid);
        assert!(!order.is_delivered);
        assert_eq!(order.status, OrderStatus::Processing);
        assert!(
            fx.store
                .find_cart_by_owner(&CartOwner::User(owner.id))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_double_finalize_leaves_one_order_and_conflicts() {
        let fx = fixture();
        let owner = principal(UserId::generate(), Role::Customer);
        let session = paid_session(&fx, &owner).await;

        fx.checkouts.finalize(&owner, session.id).await.unwrap();
        let err = fx.checkouts.finalize(&owner, session.id).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Conflict: Checkout has already been finalized"
        );
        assert_eq!(fx.store.list_orders().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_finalize_creates_exactly_one_order() {
        let fx = fixture();
        let owner = principal(UserId::generate(), Role::Customer);
        let session = paid_session(&fx, &owner).await;

        let (a, b) = tokio::join!(
            fx.checkouts.finalize(&owner, session.id),
            fx.checkouts.finalize(&owner, session.id),
        );

        assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
        assert_eq!(fx.store.list_orders().await.unwrap().len(), 1);
    }
}
