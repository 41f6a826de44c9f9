//! Registration model and lifecycle statuses

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Lifecycle status of a registration.
///
/// `PreparationInProgress` is the initial state. `preparation_completed`
/// moves it to `PreparationComplete`, and `finalize_registration` assigns
/// exactly one of `Pending`, `Registered` or `Waitinglist`. `Cancelled` is
/// reachable from any non-initial state. No other code path changes status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    PreparationInProgress,
    PreparationComplete,
    Registered,
    Waitinglist,
    Cancelled,
    Pending,
}

impl RegistrationStatus {
    /// Draft statuses: still being filled in, values mutate in place
    pub fn is_draft(self) -> bool {
        matches!(
            self,
            RegistrationStatus::PreparationInProgress | RegistrationStatus::PreparationComplete
        )
    }

    /// Admitted statuses: the registration holds a final admission decision
    pub fn is_admitted(self) -> bool {
        matches!(
            self,
            RegistrationStatus::Registered
                | RegistrationStatus::Waitinglist
                | RegistrationStatus::Pending
        )
    }

    /// Current statuses: everything except cancelled. At most one current
    /// registration may exist per (user, event).
    pub fn is_current(self) -> bool {
        self != RegistrationStatus::Cancelled
    }

    /// Statuses for which an amount due is defined
    pub fn is_billable(self) -> bool {
        self.is_admitted() || self == RegistrationStatus::Cancelled
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::PreparationInProgress => "preparation_in_progress",
            RegistrationStatus::PreparationComplete => "preparation_complete",
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Waitinglist => "waitinglist",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Pending => "pending",
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registration links a user to an event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub status: RegistrationStatus,
    /// Set exactly once, when the registration is admitted
    pub registered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRegistrationRequest {
    pub user_id: i64,
    pub event_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_groups() {
        use RegistrationStatus::*;

        assert!(PreparationInProgress.is_draft());
        assert!(PreparationComplete.is_draft());
        assert!(!Registered.is_draft());

        assert!(Registered.is_admitted());
        assert!(Waitinglist.is_admitted());
        assert!(Pending.is_admitted());
        assert!(!Cancelled.is_admitted());
        assert!(!PreparationComplete.is_admitted());

        assert!(!Cancelled.is_current());
        assert!(Waitinglist.is_current());

        assert!(Cancelled.is_billable());
        assert!(Pending.is_billable());
        assert!(!PreparationInProgress.is_billable());
    }
}
