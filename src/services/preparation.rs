//! Preparation validator
//!
//! Decides whether a registration is complete enough to leave
//! `preparation_in_progress`: the user's profile must be filled in and every
//! relevant field of the event must carry a satisfying active value. The
//! check is all-or-nothing; the first problem found fails the whole run.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::config::settings::RegistrationConfig;
use crate::models::field::{FieldType, RegistrationField, RegistrationFieldOption};
use crate::models::field_value::{RegistrationFieldValue, CHECKBOX_CHECKED, CHECKBOX_UNCHECKED};
use crate::utils::errors::{EventDeskError, Result};

/// Everything the validator needs to know about the registering user
#[derive(Debug, Clone)]
pub struct ProfileSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub has_address: bool,
    pub emergency_contacts: i64,
    pub group_ids: HashSet<i64>,
}

#[derive(Debug, Clone)]
pub struct PreparationValidator {
    min_emergency_contacts: u32,
}

impl PreparationValidator {
    pub fn new(config: &RegistrationConfig) -> Self {
        Self {
            min_emergency_contacts: config.min_emergency_contacts,
        }
    }

    /// Validate a registration against the event's field schema.
    ///
    /// `options` must contain every option of the event's fields, keyed by
    /// id. `values` are the registration's active values.
    pub fn validate(
        &self,
        profile: &ProfileSnapshot,
        fields: &[RegistrationField],
        options: &HashMap<i64, RegistrationFieldOption>,
        values: &[RegistrationFieldValue],
    ) -> Result<()> {
        self.check_profile(profile)?;

        let values_by_field: HashMap<i64, &RegistrationFieldValue> = values
            .iter()
            .filter(|v| v.active)
            .map(|v| (v.field_id, v))
            .collect();

        // Active selected options satisfy field and option dependencies
        let selected: HashSet<i64> = values_by_field
            .values()
            .filter_map(|v| v.option_id)
            .collect();

        for field in fields {
            if field.field_type == FieldType::Section {
                continue;
            }

            // Invite-only fields are skipped entirely for outsiders, even
            // when a value happens to exist
            if let Some(group_id) = field.invite_only_id {
                if !profile.group_ids.contains(&group_id) {
                    debug!(field = %field.name, "Skipping invite-only field");
                    continue;
                }
            }

            if let Some(depends_id) = field.depends_id {
                if !selected.contains(&depends_id) {
                    debug!(field = %field.name, "Skipping field with unsatisfied dependency");
                    continue;
                }
            }

            let value = values_by_field.get(&field.id).copied().ok_or_else(|| {
                EventDeskError::Validation(format!("No value for field {}", field.name))
            })?;

            if !satisfies(field, value) {
                return Err(EventDeskError::Validation(format!(
                    "Value for field {} does not satisfy its requirements",
                    field.name
                )));
            }

            if let Some(option_id) = value.option_id {
                self.check_selected_option(field, option_id, options, &selected, profile)?;
            }
        }

        Ok(())
    }

    fn check_profile(&self, profile: &ProfileSnapshot) -> Result<()> {
        if profile.first_name.trim().is_empty() {
            return Err(EventDeskError::Validation("First name is required".to_string()));
        }
        if profile.last_name.trim().is_empty() {
            return Err(EventDeskError::Validation("Last name is required".to_string()));
        }
        if !profile.has_address {
            return Err(EventDeskError::Validation("An address is required".to_string()));
        }
        if profile.emergency_contacts < self.min_emergency_contacts as i64 {
            return Err(EventDeskError::Validation(format!(
                "At least {} emergency contact(s) required",
                self.min_emergency_contacts
            )));
        }
        Ok(())
    }

    fn check_selected_option(
        &self,
        field: &RegistrationField,
        option_id: i64,
        options: &HashMap<i64, RegistrationFieldOption>,
        selected: &HashSet<i64>,
        profile: &ProfileSnapshot,
    ) -> Result<()> {
        // A value pointing at a foreign or unknown option is corrupt data,
        // not a user mistake
        let option = options.get(&option_id).ok_or_else(|| {
            EventDeskError::Integrity(format!("Option {} does not exist", option_id))
        })?;
        if option.field_id != field.id {
            return Err(EventDeskError::Integrity(format!(
                "Option {} does not belong to field {}",
                option.title, field.name
            )));
        }

        if let Some(depends_id) = option.depends_id {
            if !selected.contains(&depends_id) {
                return Err(EventDeskError::Validation(format!(
                    "Option {} requires an option that is not selected",
                    option.title
                )));
            }
        }

        if let Some(group_id) = option.invite_only_id {
            if !profile.group_ids.contains(&group_id) {
                return Err(EventDeskError::Validation(format!(
                    "Option {} is invite-only",
                    option.title
                )));
            }
        }

        Ok(())
    }
}

/// Type-specific satisfaction predicate for one field value.
///
/// Required fields use the strict form; optional fields still need a value
/// row but accept the empty/unchecked variants. Checkbox values must always
/// be a valid encoding.
fn satisfies(field: &RegistrationField, value: &RegistrationFieldValue) -> bool {
    match field.field_type {
        FieldType::Section => true,
        FieldType::Choice => !field.required || value.option_id.is_some(),
        FieldType::Image => !field.required || !value.file_value.is_empty(),
        FieldType::String | FieldType::Text | FieldType::Rating5 => {
            !field.required || !value.string_value.is_empty()
        }
        FieldType::Checkbox => {
            value.string_value == CHECKBOX_CHECKED
                || (!field.required && value.string_value == CHECKBOX_UNCHECKED)
        }
        // Checked and unchecked both count, even when required; only a
        // missing or invalid value fails
        FieldType::Uncheckbox => {
            value.string_value == CHECKBOX_CHECKED || value.string_value == CHECKBOX_UNCHECKED
        }
    }
}
