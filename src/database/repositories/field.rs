//! Registration field and option repository implementation
//!
//! Serves the event form schema to the preparation validator and the
//! per-option capacity counts to the admission transaction.

use sqlx::{FromRow, PgPool, Postgres, Transaction};
use chrono::Utc;
use crate::models::field::{
    RegistrationField, RegistrationFieldOption, CreateFieldRequest, CreateFieldOptionRequest,
};
use crate::utils::errors::EventDeskError;

/// Live capacity usage of one selected option, computed inside the event
/// lock's critical section
#[derive(Debug, Clone, FromRow)]
pub struct OptionUsage {
    pub option_id: i64,
    pub slots: i32,
    pub full: bool,
    pub used: i64,
}

#[derive(Debug, Clone)]
pub struct FieldRepository {
    pool: PgPool,
}

impl FieldRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a registration field on an event
    pub async fn create_field(&self, request: CreateFieldRequest) -> Result<RegistrationField, EventDeskError> {
        let field = sqlx::query_as::<_, RegistrationField>(
            r#"
            INSERT INTO registration_fields (event_id, sort_order, title, name, field_type, depends_id, invite_only_id, allow_change_until, required, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, event_id, sort_order, title, name, field_type, depends_id, invite_only_id, allow_change_until, required, created_at, updated_at
            "#
        )
        .bind(request.event_id)
        .bind(request.sort_order)
        .bind(request.title)
        .bind(request.name)
        .bind(request.field_type)
        .bind(request.depends_id)
        .bind(request.invite_only_id)
        .bind(request.allow_change_until)
        .bind(request.required)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(field)
    }

    /// Create an option on a choice field
    pub async fn create_option(&self, request: CreateFieldOptionRequest) -> Result<RegistrationFieldOption, EventDeskError> {
        let option = sqlx::query_as::<_, RegistrationFieldOption>(
            r#"
            INSERT INTO registration_field_options (field_id, sort_order, title, depends_id, invite_only_id, slots, price, admit_immediately, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, field_id, sort_order, title, depends_id, invite_only_id, slots, "full", price, admit_immediately, created_at, updated_at
            "#
        )
        .bind(request.field_id)
        .bind(request.sort_order)
        .bind(request.title)
        .bind(request.depends_id)
        .bind(request.invite_only_id)
        .bind(request.slots)
        .bind(request.price)
        .bind(request.admit_immediately)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(option)
    }

    /// All fields of an event, in form order
    pub async fn list_for_event(&self, event_id: i64) -> Result<Vec<RegistrationField>, EventDeskError> {
        let fields = sqlx::query_as::<_, RegistrationField>(
            "SELECT id, event_id, sort_order, title, name, field_type, depends_id, invite_only_id, allow_change_until, required, created_at, updated_at FROM registration_fields WHERE event_id = $1 ORDER BY sort_order, id"
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(fields)
    }

    /// All options of all fields of an event
    pub async fn options_for_event(&self, event_id: i64) -> Result<Vec<RegistrationFieldOption>, EventDeskError> {
        let options = sqlx::query_as::<_, RegistrationFieldOption>(
            r#"
            SELECT o.id, o.field_id, o.sort_order, o.title, o.depends_id, o.invite_only_id, o.slots, o."full", o.price, o.admit_immediately, o.created_at, o.updated_at
            FROM registration_field_options o
            JOIN registration_fields f ON f.id = o.field_id
            WHERE f.event_id = $1
            ORDER BY o.sort_order, o.title
            "#
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(options)
    }

    /// Find a single option by id
    pub async fn find_option(&self, id: i64) -> Result<Option<RegistrationFieldOption>, EventDeskError> {
        let option = sqlx::query_as::<_, RegistrationFieldOption>(
            r#"SELECT id, field_id, sort_order, title, depends_id, invite_only_id, slots, "full", price, admit_immediately, created_at, updated_at FROM registration_field_options WHERE id = $1"#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(option)
    }

    /// Options actively selected by a registration, read inside the
    /// admission transaction
    pub async fn selected_options(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        registration_id: i64,
    ) -> Result<Vec<RegistrationFieldOption>, EventDeskError> {
        let options = sqlx::query_as::<_, RegistrationFieldOption>(
            r#"
            SELECT o.id, o.field_id, o.sort_order, o.title, o.depends_id, o.invite_only_id, o.slots, o."full", o.price, o.admit_immediately, o.created_at, o.updated_at
            FROM registration_field_options o
            JOIN registration_field_values v ON v.option_id = o.id
            WHERE v.registration_id = $1 AND v.active
            "#
        )
        .bind(registration_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(options)
    }

    /// Capacity-limited options selected by a registration, annotated with
    /// their live usage count. Must run inside the event lock's critical
    /// section; only active values on `registered` registrations count.
    pub async fn selected_options_with_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        registration_id: i64,
    ) -> Result<Vec<OptionUsage>, EventDeskError> {
        let usages = sqlx::query_as::<_, OptionUsage>(
            r#"
            SELECT o.id AS option_id, o.slots AS slots, o."full" AS "full",
                   (SELECT COUNT(*)
                    FROM registration_field_values u
                    JOIN registrations r ON r.id = u.registration_id
                    WHERE u.option_id = o.id AND u.active AND r.status = 'registered') AS used
            FROM registration_field_options o
            JOIN registration_field_values v ON v.option_id = o.id
            WHERE v.registration_id = $1 AND v.active AND o.slots IS NOT NULL
            "#
        )
        .bind(registration_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(usages)
    }

    /// Mark an option's cached full flag inside the admission transaction
    pub async fn set_option_full(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        option_id: i64,
    ) -> Result<(), EventDeskError> {
        sqlx::query(r#"UPDATE registration_field_options SET "full" = TRUE, updated_at = $2 WHERE id = $1"#)
            .bind(option_id)
            .bind(Utc::now())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}
