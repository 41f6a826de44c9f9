//! Services module
//!
//! This module contains business logic services

pub mod preparation;
pub mod registration;
pub mod payment;

// Re-export commonly used services
pub use preparation::{PreparationValidator, ProfileSnapshot};
pub use registration::RegistrationStatusService;
pub use payment::PaymentReconciliation;

use crate::config::settings::Settings;
use crate::database::DatabaseService;

/// Service factory for creating and managing all services
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    pub registrations: RegistrationStatusService,
    pub payments: PaymentReconciliation,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: &Settings, db: DatabaseService) -> Self {
        let registrations = RegistrationStatusService::new(db.clone(), settings);
        let payments = PaymentReconciliation::new(db, settings.payments.clone());

        Self {
            registrations,
            payments,
        }
    }
}
