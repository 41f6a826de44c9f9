//! Registration field value model
//!
//! One active row per (registration, field). Edits on an admitted
//! registration append a new row and deactivate the previous one so a
//! versioning collaborator can snapshot history; draft edits mutate in place.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::field::{FieldType, RegistrationField, RegistrationFieldOption};

/// The actual value for a given field on a given registration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationFieldValue {
    pub id: i64,
    pub registration_id: i64,
    pub field_id: i64,
    /// Selected option, for choice fields
    pub option_id: Option<i64>,
    pub string_value: String,
    /// Stored file reference, for image fields
    pub file_value: String,
    /// Only active values count toward slots, dependencies and price
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// string_value encoding for checkbox fields
pub const CHECKBOX_CHECKED: &str = "1";
pub const CHECKBOX_UNCHECKED: &str = "0";

impl RegistrationFieldValue {
    pub fn is_checked(&self) -> bool {
        self.string_value == CHECKBOX_CHECKED
    }

    /// Human-readable rendering of this value for the given field and, for
    /// choice fields, its resolved option.
    pub fn display_value(
        &self,
        field: &RegistrationField,
        option: Option<&RegistrationFieldOption>,
    ) -> String {
        match field.field_type {
            FieldType::Choice => match option {
                Some(option) => option.title.clone(),
                None => "<value unset>".to_string(),
            },
            FieldType::Checkbox | FieldType::Uncheckbox => match self.string_value.as_str() {
                CHECKBOX_CHECKED => "Yes".to_string(),
                CHECKBOX_UNCHECKED => "No".to_string(),
                "" => "<value unset>".to_string(),
                _ => "<invalid>".to_string(),
            },
            FieldType::Image => self.file_value.clone(),
            _ => {
                if self.string_value.is_empty() {
                    "<value unset>".to_string()
                } else {
                    self.string_value.clone()
                }
            }
        }
    }
}

/// New value contents for a single field, as written by the form layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldValueContents {
    pub option_id: Option<i64>,
    pub string_value: String,
    pub file_value: String,
}

impl FieldValueContents {
    pub fn option(option_id: i64) -> Self {
        Self {
            option_id: Some(option_id),
            ..Self::default()
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string_value: value.into(),
            ..Self::default()
        }
    }

    pub fn file(value: impl Into<String>) -> Self {
        Self {
            file_value: value.into(),
            ..Self::default()
        }
    }

    pub fn checked() -> Self {
        Self::string(CHECKBOX_CHECKED)
    }

    pub fn unchecked() -> Self {
        Self::string(CHECKBOX_UNCHECKED)
    }
}
