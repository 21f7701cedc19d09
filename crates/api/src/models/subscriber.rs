//! Newsletter subscribers, keyed by email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tamarind_core::Email;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub email: Email,
    pub subscribed_at: DateTime<Utc>,
}

impl Subscriber {
    #[must_use]
    pub fn new(email: Email) -> Self {
        Self {
            email,
            subscribed_at: Utc::now(),
        }
    }
}
