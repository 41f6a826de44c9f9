//! Error handling for EventDesk
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for EventDesk application
#[derive(Error, Debug)]
pub enum EventDeskError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Data integrity error: {0}")]
    Integrity(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Registration not found: {registration_id}")]
    RegistrationNotFound { registration_id: i64 },

    #[error("Payment not found: {payment_id}")]
    PaymentNotFound { payment_id: i64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for EventDesk operations
pub type Result<T> = std::result::Result<T, EventDeskError>;

impl EventDeskError {
    /// Check if the error is recoverable by retrying the whole operation
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Lock waits and connection hiccups may succeed on a fresh attempt;
            // the admission transaction leaves no partial state behind.
            EventDeskError::Database(_) => true,
            EventDeskError::Migration(_) => false,
            EventDeskError::Config(_) => false,
            EventDeskError::Validation(_) => false,
            EventDeskError::Integrity(_) => false,
            EventDeskError::UserNotFound { .. } => false,
            EventDeskError::EventNotFound { .. } => false,
            EventDeskError::RegistrationNotFound { .. } => false,
            EventDeskError::PaymentNotFound { .. } => false,
            EventDeskError::InvalidStateTransition { .. } => false,
            EventDeskError::Serialization(_) => false,
            EventDeskError::Io(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EventDeskError::Migration(_) => ErrorSeverity::Critical,
            EventDeskError::Config(_) => ErrorSeverity::Critical,
            EventDeskError::Integrity(_) => ErrorSeverity::Critical,
            EventDeskError::Validation(_) => ErrorSeverity::Info,
            EventDeskError::UserNotFound { .. } => ErrorSeverity::Warning,
            EventDeskError::EventNotFound { .. } => ErrorSeverity::Warning,
            EventDeskError::RegistrationNotFound { .. } => ErrorSeverity::Warning,
            EventDeskError::PaymentNotFound { .. } => ErrorSeverity::Warning,
            EventDeskError::InvalidStateTransition { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
