//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod user;
pub mod event;
pub mod registration;
pub mod field;
pub mod value;
pub mod payment;

// Re-export repositories
pub use user::UserRepository;
pub use event::EventRepository;
pub use registration::RegistrationRepository;
pub use field::{FieldRepository, OptionUsage};
pub use value::ValueRepository;
pub use payment::{PaymentRepository, AmountAggregate};
