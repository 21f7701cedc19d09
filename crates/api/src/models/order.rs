//! Order documents.
//!
//! An order is materialized exactly once from a paid checkout session; the
//! `checkout_id` field is unique in the store and acts as the idempotency
//! guard. After creation only the fulfillment fields change.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tamarind_core::{CheckoutId, OrderId, OrderStatus, PaymentStatus, UserId};

use crate::models::checkout::{CheckoutItem, CheckoutSession, ShippingAddress};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub checkout_id: CheckoutId,
    pub order_items: Vec<CheckoutItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub total_price: Decimal,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub payment_details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Materialize an order from a paid checkout session.
    ///
    /// Copies the session snapshot verbatim; fulfillment starts at
    /// `processing`, undelivered.
    #[must_use]
    pub fn from_session(session: &CheckoutSession) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            user: session.user,
            checkout_id: session.id,
            order_items: session.checkout_items.clone(),
            shipping_address: session.shipping_address.clone(),
            payment_method: session.payment_method.clone(),
            total_price: session.total_price,
            is_paid: true,
            paid_at: session.paid_at,
            is_delivered: false,
            delivered_at: None,
            payment_status: PaymentStatus::Paid,
            status: OrderStatus::Processing,
            payment_details: session.payment_details.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the fulfillment status.
    ///
    /// `delivered` flips `is_delivered` and stamps `delivered_at`; any other
    /// status clears `is_delivered` but keeps the old `delivered_at` as a
    /// record of the earlier delivery.
    pub fn set_status(&mut self, status: OrderStatus) {
        let now = Utc::now();
        if status == OrderStatus::Delivered {
            self.is_delivered = true;
            self.delivered_at = Some(now);
        } else {
            self.is_delivered = false;
        }
        self.status = status;
        self.updated_at = now;
    }
}
