//! Registration field and option models
//!
//! Events carry a configurable form schema: fields of a closed set of types,
//! each optionally gated behind a dependency option or an invite group.
//! Choice fields own options that may carry a price, a slot capacity and an
//! admission-immediacy override.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_field_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Section,
    Choice,
    Rating5,
    String,
    Text,
    Image,
    Checkbox,
    Uncheckbox,
}

/// A field that should get a value during registration for a specific event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationField {
    pub id: i64,
    pub event_id: i64,
    pub sort_order: i32,
    pub title: String,
    /// Short identifier, unique within the event
    pub name: String,
    pub field_type: FieldType,
    /// Option that must be actively selected elsewhere on the same
    /// registration for this field to be relevant
    pub depends_id: Option<i64>,
    /// Group the user must belong to for this field to apply at all
    pub invite_only_id: Option<i64>,
    /// The field can be changed until (including) this date. If empty, the
    /// field cannot be changed after admission.
    pub allow_change_until: Option<NaiveDate>,
    pub required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegistrationField {
    pub fn allow_change(&self, today: NaiveDate) -> bool {
        match self.allow_change_until {
            Some(until) => today <= until,
            None => false,
        }
    }
}

/// One of multiple options that can be assigned to a given choice field.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationFieldOption {
    pub id: i64,
    pub field_id: i64,
    pub sort_order: i32,
    pub title: String,
    pub depends_id: Option<i64>,
    pub invite_only_id: Option<i64>,
    /// Admission capacity scoped to this option, null = unlimited
    pub slots: Option<i32>,
    /// Cached capacity flag, advisory only
    pub full: bool,
    /// Signed price, negative for discounts
    pub price: Option<Decimal>,
    /// Overrides the event's admit_immediately when this option is selected
    pub admit_immediately: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFieldRequest {
    pub event_id: i64,
    pub sort_order: i32,
    pub title: String,
    pub name: String,
    pub field_type: FieldType,
    pub depends_id: Option<i64>,
    pub invite_only_id: Option<i64>,
    pub allow_change_until: Option<NaiveDate>,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFieldOptionRequest {
    pub field_id: i64,
    pub sort_order: i32,
    pub title: String,
    pub depends_id: Option<i64>,
    pub invite_only_id: Option<i64>,
    pub slots: Option<i32>,
    pub price: Option<Decimal>,
    pub admit_immediately: Option<bool>,
}
