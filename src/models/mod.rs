//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod event;
pub mod registration;
pub mod field;
pub mod field_value;
pub mod payment;

// Re-export commonly used models
pub use user::{User, Address, EmergencyContact, UserGroup, CreateUserRequest, CreateAddressRequest, CreateEmergencyContactRequest};
pub use event::{Event, CreateEventRequest};
pub use registration::{Registration, RegistrationStatus, CreateRegistrationRequest};
pub use field::{RegistrationField, RegistrationFieldOption, FieldType, CreateFieldRequest, CreateFieldOptionRequest};
pub use field_value::{RegistrationFieldValue, FieldValueContents, CHECKBOX_CHECKED, CHECKBOX_UNCHECKED};
pub use payment::{Payment, PaymentState, PaymentStatus, PaymentSummary, GatewayOutcome, RegistrationPriceCorrection, CreatePaymentRequest, CreatePriceCorrectionRequest};
