//! Event repository implementation

use sqlx::{PgPool, Postgres, Transaction};
use chrono::Utc;
use crate::models::event::{Event, CreateEventRequest};
use crate::utils::errors::EventDeskError;

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, request: CreateEventRequest) -> Result<Event, EventDeskError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, description, start_date, end_date, slots, admit_immediately, registration_opens_at, registration_closes_at, public, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, title, description, start_date, end_date, slots, "full", admit_immediately, registration_opens_at, registration_closes_at, public, created_at, updated_at
            "#
        )
        .bind(request.title)
        .bind(request.description)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.slots)
        .bind(request.admit_immediately)
        .bind(request.registration_opens_at)
        .bind(request.registration_closes_at)
        .bind(request.public)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, EventDeskError> {
        let event = sqlx::query_as::<_, Event>(
            r#"SELECT id, title, description, start_date, end_date, slots, "full", admit_immediately, registration_opens_at, registration_closes_at, public, created_at, updated_at FROM events WHERE id = $1"#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Acquire an exclusive row lock on the event inside the transaction.
    ///
    /// Every admission for the same event serializes on this lock; it is
    /// taken even when the event declares no slots so that admission
    /// immediacy and per-option capacity decisions stay serialized too.
    pub async fn lock_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Event, EventDeskError> {
        let event = sqlx::query_as::<_, Event>(
            r#"SELECT id, title, description, start_date, end_date, slots, "full", admit_immediately, registration_opens_at, registration_closes_at, public, created_at, updated_at FROM events WHERE id = $1 FOR UPDATE"#
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        event.ok_or(EventDeskError::EventNotFound { event_id: id })
    }

    /// Count registrations currently holding an event slot. Only status
    /// `registered` consumes capacity.
    pub async fn used_slots(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
    ) -> Result<i64, EventDeskError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = 'registered'"
        )
        .bind(event_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(count.0)
    }

    /// Mark the event's cached full flag
    pub async fn set_full(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<(), EventDeskError> {
        sqlx::query(r#"UPDATE events SET "full" = TRUE, updated_at = $2 WHERE id = $1"#)
            .bind(id)
            .bind(Utc::now())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Count total events
    pub async fn count(&self) -> Result<i64, EventDeskError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
