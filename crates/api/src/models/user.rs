//! User account documents.
//!
//! No credential material lives here; identity is proven by a signed bearer
//! token and the server only resolves the principal it names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tamarind_core::{Email, Role, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn new(name: String, email: Email, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::generate(),
            name,
            email,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. `None` fields keep their stored value.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        self.updated_at = Utc::now();
    }
}

/// Field-by-field update for admin user management.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub role: Option<Role>,
}
