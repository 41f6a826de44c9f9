//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging
//! utilities for the EventDesk application.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "eventdesk.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(())
}

/// Log an admission decision with structured data
pub fn log_admission(registration_id: i64, event_id: i64, status: &str, waited_for_lock_ms: u64) {
    info!(
        registration_id = registration_id,
        event_id = event_id,
        status = status,
        waited_for_lock_ms = waited_for_lock_ms,
        "Admission decision made"
    );
}

/// Log payment state changes
pub fn log_payment_update(payment_id: i64, registration_id: i64, status: &str, gateway_status: Option<&str>) {
    info!(
        payment_id = payment_id,
        registration_id = registration_id,
        status = status,
        gateway_status = gateway_status,
        "Payment status updated"
    );
}

/// Log registration lifecycle actions
pub fn log_registration_action(registration_id: i64, user_id: i64, action: &str, details: Option<&str>) {
    info!(
        registration_id = registration_id,
        user_id = user_id,
        action = action,
        details = details,
        "Registration action performed"
    );
}

/// Log capacity cache updates
pub fn log_capacity_update(resource: &str, resource_id: i64, full: bool) {
    if full {
        warn!(
            resource = resource,
            resource_id = resource_id,
            "Capacity resource marked full"
        );
    } else {
        info!(
            resource = resource,
            resource_id = resource_id,
            "Capacity resource reopened"
        );
    }
}

