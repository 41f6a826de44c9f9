//! Registration field value repository implementation
//!
//! Implements the two write paths for values: in-place mutation while the
//! owning registration is a draft, append-and-deactivate once it is
//! admitted, so superseded rows remain for the versioning collaborator.

use sqlx::PgPool;
use chrono::Utc;
use crate::models::field::RegistrationField;
use crate::models::field_value::{FieldValueContents, RegistrationFieldValue};
use crate::models::registration::Registration;
use crate::utils::errors::EventDeskError;

#[derive(Debug, Clone)]
pub struct ValueRepository {
    pool: PgPool,
}

impl ValueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active values of a registration
    pub async fn active_for_registration(&self, registration_id: i64) -> Result<Vec<RegistrationFieldValue>, EventDeskError> {
        let values = sqlx::query_as::<_, RegistrationFieldValue>(
            "SELECT id, registration_id, field_id, option_id, string_value, file_value, active, created_at, updated_at FROM registration_field_values WHERE registration_id = $1 AND active"
        )
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }

    /// The active value of one field on a registration
    pub async fn active_for_field(
        &self,
        registration_id: i64,
        field_id: i64,
    ) -> Result<Option<RegistrationFieldValue>, EventDeskError> {
        let value = sqlx::query_as::<_, RegistrationFieldValue>(
            "SELECT id, registration_id, field_id, option_id, string_value, file_value, active, created_at, updated_at FROM registration_field_values WHERE registration_id = $1 AND field_id = $2 AND active"
        )
        .bind(registration_id)
        .bind(field_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    /// Full value history of a registration, superseded rows included
    pub async fn history_for_registration(&self, registration_id: i64) -> Result<Vec<RegistrationFieldValue>, EventDeskError> {
        let values = sqlx::query_as::<_, RegistrationFieldValue>(
            "SELECT id, registration_id, field_id, option_id, string_value, file_value, active, created_at, updated_at FROM registration_field_values WHERE registration_id = $1 ORDER BY created_at, id"
        )
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }

    /// Write the value of a field on a registration.
    ///
    /// Draft registrations mutate the existing row in place. Admitted
    /// registrations get a fresh active row while the previous one is
    /// deactivated, provided the field still allows changes.
    pub async fn set_value(
        &self,
        registration: &Registration,
        field: &RegistrationField,
        contents: FieldValueContents,
    ) -> Result<RegistrationFieldValue, EventDeskError> {
        if registration.status.is_draft() {
            return self.upsert_draft_value(registration.id, field.id, contents).await;
        }

        if !field.allow_change(Utc::now().date_naive()) {
            return Err(EventDeskError::Validation(format!(
                "Field {} can no longer be changed",
                field.name
            )));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE registration_field_values SET active = FALSE, updated_at = $3 WHERE registration_id = $1 AND field_id = $2 AND active"
        )
        .bind(registration.id)
        .bind(field.id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let value = sqlx::query_as::<_, RegistrationFieldValue>(
            r#"
            INSERT INTO registration_field_values (registration_id, field_id, option_id, string_value, file_value, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7)
            RETURNING id, registration_id, field_id, option_id, string_value, file_value, active, created_at, updated_at
            "#
        )
        .bind(registration.id)
        .bind(field.id)
        .bind(contents.option_id)
        .bind(contents.string_value)
        .bind(contents.file_value)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(value)
    }

    /// Deactivate the active value of a field without writing a replacement
    pub async fn deactivate(&self, registration_id: i64, field_id: i64) -> Result<(), EventDeskError> {
        sqlx::query(
            "UPDATE registration_field_values SET active = FALSE, updated_at = $3 WHERE registration_id = $1 AND field_id = $2 AND active"
        )
        .bind(registration_id)
        .bind(field_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_draft_value(
        &self,
        registration_id: i64,
        field_id: i64,
        contents: FieldValueContents,
    ) -> Result<RegistrationFieldValue, EventDeskError> {
        if let Some(existing) = self.active_for_field(registration_id, field_id).await? {
            let value = sqlx::query_as::<_, RegistrationFieldValue>(
                r#"
                UPDATE registration_field_values
                SET option_id = $2, string_value = $3, file_value = $4, updated_at = $5
                WHERE id = $1
                RETURNING id, registration_id, field_id, option_id, string_value, file_value, active, created_at, updated_at
                "#
            )
            .bind(existing.id)
            .bind(contents.option_id)
            .bind(contents.string_value)
            .bind(contents.file_value)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

            return Ok(value);
        }

        let value = sqlx::query_as::<_, RegistrationFieldValue>(
            r#"
            INSERT INTO registration_field_values (registration_id, field_id, option_id, string_value, file_value, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7)
            RETURNING id, registration_id, field_id, option_id, string_value, file_value, active, created_at, updated_at
            "#
        )
        .bind(registration_id)
        .bind(field_id)
        .bind(contents.option_id)
        .bind(contents.string_value)
        .bind(contents.file_value)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(value)
    }
}
