//! User, profile and group models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub postalcode: String,
    pub city: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact to notify when an emergency involves the user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmergencyContact {
    pub id: i64,
    pub user_id: i64,
    pub contact_name: String,
    pub relation: String,
    pub phone_number: String,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmergencyContact {
    pub const MAX_PER_USER: u32 = 3;
}

/// Named user group gating invite-only fields and options
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserGroup {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAddressRequest {
    pub user_id: i64,
    pub address: String,
    pub postalcode: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmergencyContactRequest {
    pub user_id: i64,
    pub contact_name: String,
    pub relation: String,
    pub phone_number: String,
    pub remarks: String,
}
