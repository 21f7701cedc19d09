//! Checkout session documents.
//!
//! A session moves one way through `pending/unpaid -> paid -> finalized`.
//! The paid and finalized transitions are driven by `services::checkout`;
//! this module only holds the document shape and the field stamping.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tamarind_core::{CheckoutId, PaymentStatus, ProductId, UserId};

use crate::models::product::ProductImage;

/// One item of a checkout, supplied by the caller at session creation.
///
/// Same shape as a cart line. The server persists it as sent and copies it
/// verbatim into the order at finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: Option<ProductImage>,
    pub price: Decimal,
    pub color: String,
    pub size: String,
    pub quantity: u32,
}

/// Delivery destination captured with the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: CheckoutId,
    pub user: UserId,
    pub checkout_items: Vec<CheckoutItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub total_price: Decimal,
    pub payment_status: PaymentStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_finalized: bool,
    pub finalized_at: Option<DateTime<Utc>>,
    /// Opaque gateway payload recorded at payment time.
    pub payment_details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckoutSession {
    /// Open a pending, unpaid session for `user`.
    #[must_use]
    pub fn new(
        user: UserId,
        checkout_items: Vec<CheckoutItem>,
        shipping_address: ShippingAddress,
        payment_method: String,
        total_price: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CheckoutId::generate(),
            user,
            checkout_items,
            shipping_address,
            payment_method,
            total_price,
            payment_status: PaymentStatus::Pending,
            is_paid: false,
            paid_at: None,
            is_finalized: false,
            finalized_at: None,
            payment_details: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a successful payment.
    pub fn mark_paid(&mut self, payment_details: Option<serde_json::Value>) {
        let now = Utc::now();
        self.is_paid = true;
        self.payment_status = PaymentStatus::Paid;
        self.paid_at = Some(now);
        self.payment_details = payment_details;
        self.updated_at = now;
    }

    /// Close the session after its order has been materialized.
    pub fn mark_finalized(&mut self) {
        let now = Utc::now();
        self.is_finalized = true;
        self.finalized_at = Some(now);
        self.updated_at = now;
    }
}
