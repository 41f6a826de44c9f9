//! User repository implementation
//!
//! Covers the user rows themselves plus the profile records (address,
//! emergency contacts) and invite-group membership the preparation
//! validator needs.

use sqlx::{PgPool, Postgres, Transaction};
use chrono::Utc;
use crate::models::user::{
    User, Address, EmergencyContact, UserGroup,
    CreateUserRequest, CreateAddressRequest, CreateEmergencyContactRequest,
};
use crate::utils::errors::EventDeskError;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, EventDeskError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, email, created_at, updated_at
            "#
        )
        .bind(request.first_name)
        .bind(request.last_name)
        .bind(request.email)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, EventDeskError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, first_name, last_name, email, created_at, updated_at FROM users WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Acquire an exclusive row lock on the user inside the transaction.
    ///
    /// Serializes a user's own concurrent double-submits; always taken after
    /// the event lock.
    pub async fn lock_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<User, EventDeskError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, first_name, last_name, email, created_at, updated_at FROM users WHERE id = $1 FOR UPDATE"
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        user.ok_or(EventDeskError::UserNotFound { user_id: id })
    }

    /// Store the user's address (one per user)
    pub async fn add_address(&self, request: CreateAddressRequest) -> Result<Address, EventDeskError> {
        let address = sqlx::query_as::<_, Address>(
            r#"
            INSERT INTO addresses (user_id, address, postalcode, city, country, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, address, postalcode, city, country, created_at, updated_at
            "#
        )
        .bind(request.user_id)
        .bind(request.address)
        .bind(request.postalcode)
        .bind(request.city)
        .bind(request.country)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(address)
    }

    /// Check whether the user has an address on file
    pub async fn has_address(&self, user_id: i64) -> Result<bool, EventDeskError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM addresses WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }

    /// Add an emergency contact for the user
    pub async fn add_emergency_contact(
        &self,
        request: CreateEmergencyContactRequest,
    ) -> Result<EmergencyContact, EventDeskError> {
        let existing = self.emergency_contact_count(request.user_id).await?;
        if existing >= EmergencyContact::MAX_PER_USER as i64 {
            return Err(EventDeskError::Validation(format!(
                "At most {} emergency contacts per user",
                EmergencyContact::MAX_PER_USER
            )));
        }

        let contact = sqlx::query_as::<_, EmergencyContact>(
            r#"
            INSERT INTO emergency_contacts (user_id, contact_name, relation, phone_number, remarks, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, contact_name, relation, phone_number, remarks, created_at, updated_at
            "#
        )
        .bind(request.user_id)
        .bind(request.contact_name)
        .bind(request.relation)
        .bind(request.phone_number)
        .bind(request.remarks)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(contact)
    }

    /// Count the user's emergency contacts
    pub async fn emergency_contact_count(&self, user_id: i64) -> Result<i64, EventDeskError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM emergency_contacts WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Create a named user group
    pub async fn create_group(&self, name: &str) -> Result<UserGroup, EventDeskError> {
        let group = sqlx::query_as::<_, UserGroup>(
            r#"
            INSERT INTO user_groups (name, created_at, updated_at)
            VALUES ($1, $2, $3)
            RETURNING id, name, created_at, updated_at
            "#
        )
        .bind(name)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    /// Add a user to a group
    pub async fn add_group_member(&self, group_id: i64, user_id: i64) -> Result<(), EventDeskError> {
        sqlx::query(
            "INSERT INTO user_group_members (group_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the ids of all groups the user belongs to
    pub async fn group_ids_for_user(&self, user_id: i64) -> Result<Vec<i64>, EventDeskError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT group_id FROM user_group_members WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64, EventDeskError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
