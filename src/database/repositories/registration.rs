//! Registration repository implementation
//!
//! Reads are plain pool queries; the status writes used by admission take an
//! open transaction so they commit together with the capacity bookkeeping.

use sqlx::{PgPool, Postgres, Transaction};
use chrono::{DateTime, Utc};
use crate::models::registration::{Registration, RegistrationStatus, CreateRegistrationRequest};
use crate::utils::errors::EventDeskError;

#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new draft registration for a user on an event
    pub async fn create(&self, request: CreateRegistrationRequest) -> Result<Registration, EventDeskError> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            INSERT INTO registrations (user_id, event_id, status, created_at, updated_at)
            VALUES ($1, $2, 'preparation_in_progress', $3, $4)
            RETURNING id, user_id, event_id, status, registered_at, created_at, updated_at
            "#
        )
        .bind(request.user_id)
        .bind(request.event_id)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Find registration by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Registration>, EventDeskError> {
        let registration = sqlx::query_as::<_, Registration>(
            "SELECT id, user_id, event_id, status, registered_at, created_at, updated_at FROM registrations WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Re-read a registration inside an open transaction. Used for the
    /// freshness check after the admission locks are acquired.
    pub async fn find_by_id_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<Registration>, EventDeskError> {
        let registration = sqlx::query_as::<_, Registration>(
            "SELECT id, user_id, event_id, status, registered_at, created_at, updated_at FROM registrations WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(registration)
    }

    /// The current (non-cancelled) registration of a user for an event
    pub async fn current_for(&self, event_id: i64, user_id: i64) -> Result<Option<Registration>, EventDeskError> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, user_id, event_id, status, registered_at, created_at, updated_at
            FROM registrations
            WHERE event_id = $1 AND user_id = $2 AND status <> 'cancelled'
            ORDER BY created_at DESC
            LIMIT 1
            "#
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Update the status of a draft or cancelled-bound registration
    pub async fn set_status(&self, id: i64, status: RegistrationStatus) -> Result<Registration, EventDeskError> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            UPDATE registrations
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, user_id, event_id, status, registered_at, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Persist the admission decision and timestamp inside the admission
    /// transaction
    pub async fn admit(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        status: RegistrationStatus,
        registered_at: DateTime<Utc>,
    ) -> Result<Registration, EventDeskError> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            UPDATE registrations
            SET status = $2, registered_at = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, user_id, event_id, status, registered_at, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(status)
        .bind(registered_at)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        Ok(registration)
    }

    /// Number of waiting list registrations for the same event admitted
    /// before this one. Rank is derived from registered_at; no sequence
    /// counter is stored.
    pub async fn waitinglist_above(&self, registration: &Registration) -> Result<i64, EventDeskError> {
        let registered_at = registration.registered_at.ok_or_else(|| {
            EventDeskError::Validation("Registration is not on the waiting list".to_string())
        })?;

        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM registrations
            WHERE event_id = $1 AND status = 'waitinglist' AND registered_at < $2
            "#
        )
        .bind(registration.event_id)
        .bind(registered_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Count registrations with the given status for an event
    pub async fn count_with_status(
        &self,
        event_id: i64,
        status: RegistrationStatus,
    ) -> Result<i64, EventDeskError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = $2"
        )
        .bind(event_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
