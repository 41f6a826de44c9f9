//! EventDesk registration engine
//!
//! A registration admission and billing reconciliation engine for
//! capacity-limited events. This library provides the registration lifecycle
//! state machine, the preparation validator that gates completion, the locked
//! slot-allocation transaction, and payment reconciliation over priced
//! options, manual corrections, and payment records.

#![allow(non_snake_case)]

pub mod config;
pub mod services;
pub mod models;
pub mod database;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{EventDeskError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
