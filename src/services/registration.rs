//! Registration status service
//!
//! The only code path that transitions a registration's status. Completion
//! runs the preparation validator; finalization runs the slot allocation
//! transaction that decides registered / waiting list / pending under the
//! event and user row locks.

use std::collections::HashMap;
use chrono::Utc;
use tracing::debug;

use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::models::registration::{Registration, RegistrationStatus};
use crate::services::preparation::{PreparationValidator, ProfileSnapshot};
use crate::utils::errors::{EventDeskError, Result};
use crate::utils::logging;

#[derive(Debug, Clone)]
pub struct RegistrationStatusService {
    db: DatabaseService,
    validator: PreparationValidator,
}

impl RegistrationStatusService {
    /// Create a new RegistrationStatusService instance
    pub fn new(db: DatabaseService, settings: &Settings) -> Self {
        Self {
            db,
            validator: PreparationValidator::new(&settings.registration),
        }
    }

    /// Mark a registration's preparation as complete.
    ///
    /// No-op when already complete. Fails with a validation error when the
    /// registration is not in preparation, or when the preparation validator
    /// rejects it. All-or-nothing: a failed check leaves the status alone.
    pub async fn preparation_completed(&self, registration_id: i64) -> Result<()> {
        let registration = self
            .db
            .registrations
            .find_by_id(registration_id)
            .await?
            .ok_or(EventDeskError::RegistrationNotFound { registration_id })?;

        match registration.status {
            RegistrationStatus::PreparationComplete => {
                debug!(registration_id, "Preparation already complete");
                return Ok(());
            }
            RegistrationStatus::PreparationInProgress => {}
            status => {
                return Err(EventDeskError::Validation(format!(
                    "Cannot complete preparation from status {}",
                    status
                )));
            }
        }

        let user = self
            .db
            .users
            .find_by_id(registration.user_id)
            .await?
            .ok_or(EventDeskError::UserNotFound { user_id: registration.user_id })?;

        let profile = ProfileSnapshot {
            first_name: user.first_name,
            last_name: user.last_name,
            has_address: self.db.users.has_address(registration.user_id).await?,
            emergency_contacts: self.db.users.emergency_contact_count(registration.user_id).await?,
            group_ids: self
                .db
                .users
                .group_ids_for_user(registration.user_id)
                .await?
                .into_iter()
                .collect(),
        };

        let fields = self.db.fields.list_for_event(registration.event_id).await?;
        let options: HashMap<_, _> = self
            .db
            .fields
            .options_for_event(registration.event_id)
            .await?
            .into_iter()
            .map(|o| (o.id, o))
            .collect();
        let values = self.db.values.active_for_registration(registration.id).await?;

        self.validator.validate(&profile, &fields, &options, &values)?;

        self.db
            .registrations
            .set_status(registration.id, RegistrationStatus::PreparationComplete)
            .await?;

        logging::log_registration_action(
            registration_id,
            registration.user_id,
            "preparation_completed",
            None,
        );
        Ok(())
    }

    /// Finalize a registration, allocating admission slots.
    ///
    /// Runs as a single transaction with two row locks taken in fixed order
    /// (event, then user) so concurrent finalizations for the same event
    /// serialize on the capacity decision. The registration's status is
    /// re-read after locking; a concurrent call that got there first makes
    /// this one fail with a validation error instead of admitting twice.
    pub async fn finalize_registration(&self, registration_id: i64) -> Result<Registration> {
        let registration = self
            .db
            .registrations
            .find_by_id(registration_id)
            .await?
            .ok_or(EventDeskError::RegistrationNotFound { registration_id })?;

        if registration.status != RegistrationStatus::PreparationComplete {
            return Err(EventDeskError::Validation(
                "Registration not ready for finalization".to_string(),
            ));
        }

        // Dropping the transaction on any error path rolls everything back,
        // including full-flag updates made below.
        let mut tx = self.db.pool().begin().await?;

        let lock_started = std::time::Instant::now();
        let event = self.db.events.lock_for_update(&mut tx, registration.event_id).await?;
        self.db.users.lock_for_update(&mut tx, registration.user_id).await?;
        let waited_for_lock_ms = lock_started.elapsed().as_millis() as u64;

        let registration = self
            .db
            .registrations
            .find_by_id_in_tx(&mut tx, registration_id)
            .await?
            .ok_or(EventDeskError::RegistrationNotFound { registration_id })?;

        if registration.status != RegistrationStatus::PreparationComplete {
            return Err(EventDeskError::Validation(
                "Registration not ready for finalization".to_string(),
            ));
        }

        let now = Utc::now();
        if !event.registration_is_open(now) {
            return Err(EventDeskError::Validation(
                "Registration for this event is not open".to_string(),
            ));
        }

        // A selected option's override takes precedence over the event; a
        // true override wins when several options set one.
        let selected = self.db.fields.selected_options(&mut tx, registration.id).await?;
        let admit_immediately = selected
            .iter()
            .filter_map(|o| o.admit_immediately)
            .max()
            .unwrap_or(event.admit_immediately);

        let status = if !admit_immediately {
            // Pending registrations never consume capacity
            RegistrationStatus::Pending
        } else {
            self.allocate_slots(&mut tx, &registration, &event).await?
        };

        let registration = self
            .db
            .registrations
            .admit(&mut tx, registration.id, status, now)
            .await?;

        tx.commit().await?;

        logging::log_admission(
            registration_id,
            registration.event_id,
            status.as_str(),
            waited_for_lock_ms,
        );

        Ok(registration)
    }

    /// Cancel a registration. Reachable from any non-initial state; the
    /// slot it held is not reclaimed here, the full caches stay advisory.
    pub async fn cancel_registration(&self, registration_id: i64) -> Result<Registration> {
        let registration = self
            .db
            .registrations
            .find_by_id(registration_id)
            .await?
            .ok_or(EventDeskError::RegistrationNotFound { registration_id })?;

        match registration.status {
            RegistrationStatus::PreparationInProgress | RegistrationStatus::Cancelled => {
                return Err(EventDeskError::InvalidStateTransition {
                    from: registration.status.to_string(),
                    to: RegistrationStatus::Cancelled.to_string(),
                });
            }
            _ => {}
        }

        let registration = self
            .db
            .registrations
            .set_status(registration.id, RegistrationStatus::Cancelled)
            .await?;

        logging::log_registration_action(registration_id, registration.user_id, "cancelled", None);
        Ok(registration)
    }

    /// Decide registered vs waiting list from live usage counts, and mark
    /// exhausted resources' full caches. Must run inside the event lock.
    async fn allocate_slots(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        registration: &Registration,
        event: &crate::models::event::Event,
    ) -> Result<RegistrationStatus> {
        let option_usage = self
            .db
            .fields
            .selected_options_with_usage(tx, registration.id)
            .await?;

        let event_usage = match event.slots {
            Some(slots) => Some((slots, self.db.events.used_slots(tx, event.id).await?)),
            None => None,
        };

        let any_option_full = option_usage
            .iter()
            .any(|u| u.full || u.used >= u.slots as i64);
        let event_is_full = match event_usage {
            Some((slots, used)) => event.full || used >= slots as i64,
            None => false,
        };

        if any_option_full || event_is_full {
            debug!(
                registration_id = registration.id,
                event_id = event.id,
                "No slots left, adding to waiting list"
            );
            return Ok(RegistrationStatus::Waitinglist);
        }

        // Cache the full flag for resources whose last slot we just took.
        // The cache only short-circuits future reads; the count above stays
        // authoritative.
        for usage in &option_usage {
            if usage.slots as i64 - usage.used == 1 {
                self.db.fields.set_option_full(tx, usage.option_id).await?;
                logging::log_capacity_update("option", usage.option_id, true);
            }
        }
        if let Some((slots, used)) = event_usage {
            if slots as i64 - used == 1 {
                self.db.events.set_full(tx, event.id).await?;
                logging::log_capacity_update("event", event.id, true);
            }
        }

        Ok(RegistrationStatus::Registered)
    }
}
