//! Database service layer
//!
//! This module provides a high-level interface to database operations

use crate::database::{
    DatabasePool, UserRepository, EventRepository, RegistrationRepository,
    FieldRepository, ValueRepository, PaymentRepository,
};
use crate::models::*;
use crate::utils::errors::EventDeskError;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub users: UserRepository,
    pub events: EventRepository,
    pub registrations: RegistrationRepository,
    pub fields: FieldRepository,
    pub values: ValueRepository,
    pub payments: PaymentRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            fields: FieldRepository::new(pool.clone()),
            values: ValueRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            pool,
        }
    }

    /// The underlying connection pool, for multi-repository transactions
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Start a registration for a user on an event, reusing the current one
    /// when it already exists
    pub async fn start_registration(&self, event_id: i64, user_id: i64) -> Result<Registration, EventDeskError> {
        if let Some(existing) = self.registrations.current_for(event_id, user_id).await? {
            return Ok(existing);
        }

        if self.events.find_by_id(event_id).await?.is_none() {
            return Err(EventDeskError::EventNotFound { event_id });
        }
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(EventDeskError::UserNotFound { user_id });
        }

        self.registrations
            .create(CreateRegistrationRequest { user_id, event_id })
            .await
    }

    /// Write a field value on a registration, resolving the owning field
    pub async fn set_field_value(
        &self,
        registration_id: i64,
        field_id: i64,
        contents: FieldValueContents,
    ) -> Result<RegistrationFieldValue, EventDeskError> {
        let registration = self
            .registrations
            .find_by_id(registration_id)
            .await?
            .ok_or(EventDeskError::RegistrationNotFound { registration_id })?;

        let fields = self.fields.list_for_event(registration.event_id).await?;
        let field = fields
            .into_iter()
            .find(|f| f.id == field_id)
            .ok_or_else(|| EventDeskError::Integrity(format!(
                "Field {} does not belong to event {}",
                field_id, registration.event_id
            )))?;

        // A choice value must reference an option of its own field
        if let Some(option_id) = contents.option_id {
            let option = self
                .fields
                .find_option(option_id)
                .await?
                .ok_or_else(|| EventDeskError::Integrity(format!("Option {} does not exist", option_id)))?;
            if option.field_id != field.id {
                return Err(EventDeskError::Integrity(format!(
                    "Option {} does not belong to field {}",
                    option_id, field.name
                )));
            }
        }

        self.values.set_value(&registration, &field, contents).await
    }
}
