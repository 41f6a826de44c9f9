//! Event model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Event-wide admission capacity, null = unlimited
    pub slots: Option<i32>,
    /// Cached capacity flag, advisory only; the live count decides
    pub full: bool,
    pub admit_immediately: bool,
    pub registration_opens_at: Option<DateTime<Utc>>,
    pub registration_closes_at: Option<DateTime<Utc>>,
    pub public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether registrations can be finalized for this event at `now`.
    ///
    /// Open means: the event is public, an opening time is set and has
    /// passed, and the closing time (if any) has not.
    pub fn registration_is_open(&self, now: DateTime<Utc>) -> bool {
        if !self.public {
            return false;
        }
        match self.registration_opens_at {
            None => false,
            Some(opens_at) if now < opens_at => false,
            Some(_) => match self.registration_closes_at {
                Some(closes_at) => now < closes_at,
                None => true,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub slots: Option<i32>,
    pub admit_immediately: bool,
    pub registration_opens_at: Option<DateTime<Utc>>,
    pub registration_closes_at: Option<DateTime<Utc>>,
    pub public: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(opens: Option<i64>, closes: Option<i64>, public: bool) -> Event {
        let now = Utc::now();
        Event {
            id: 1,
            title: "Test event".to_string(),
            description: None,
            start_date: now + Duration::days(7),
            end_date: now + Duration::days(9),
            slots: None,
            full: false,
            admit_immediately: true,
            registration_opens_at: opens.map(|d| now + Duration::days(d)),
            registration_closes_at: closes.map(|d| now + Duration::days(d)),
            public,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_closed_without_opening_time() {
        assert!(!event(None, None, true).registration_is_open(Utc::now()));
    }

    #[test]
    fn test_closed_before_opening_time() {
        assert!(!event(Some(1), None, true).registration_is_open(Utc::now()));
    }

    #[test]
    fn test_open_after_opening_time() {
        assert!(event(Some(-1), None, true).registration_is_open(Utc::now()));
    }

    #[test]
    fn test_closed_after_closing_time() {
        assert!(!event(Some(-8), Some(-3), true).registration_is_open(Utc::now()));
    }

    #[test]
    fn test_open_between_open_and_close() {
        assert!(event(Some(-1), Some(5), true).registration_is_open(Utc::now()));
    }

    #[test]
    fn test_hidden_event_is_closed() {
        assert!(!event(Some(-1), None, false).registration_is_open(Utc::now()));
    }
}
