//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use velostore_core::{Email, UserId};

/// A storefront user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    /// Legacy flat delivery address; the street line of profile-derived
    /// shipping addresses.
    pub delivery_address: String,
    pub phone: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity resolved from a bearer credential for the current request.
///
/// This is the only server-side representation of "who is calling": a
/// per-request value handed to services, never ambient state.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub is_admin: bool,
}

/// Public profile view returned by auth and profile endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub delivery_address: String,
    pub phone: String,
    pub is_admin: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            delivery_address: user.delivery_address.clone(),
            phone: user.phone.clone(),
            is_admin: user.is_admin,
        }
    }
}
