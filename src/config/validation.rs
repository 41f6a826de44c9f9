//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{EventDeskError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_registration_config(&settings.registration)?;
    validate_payments_config(&settings.payments)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(EventDeskError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(EventDeskError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(EventDeskError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate registration configuration
fn validate_registration_config(config: &super::RegistrationConfig) -> Result<()> {
    if config.min_emergency_contacts == 0 {
        return Err(EventDeskError::Config(
            "At least one emergency contact must be required".to_string()
        ));
    }

    if config.min_emergency_contacts > crate::models::user::EmergencyContact::MAX_PER_USER {
        return Err(EventDeskError::Config(format!(
            "Cannot require more than {} emergency contacts",
            crate::models::user::EmergencyContact::MAX_PER_USER
        )));
    }

    Ok(())
}

/// Validate payments configuration
fn validate_payments_config(config: &super::PaymentsConfig) -> Result<()> {
    if config.currency.len() != 3 {
        return Err(EventDeskError::Config(format!(
            "Currency must be a 3-letter ISO code, got: {}", config.currency
        )));
    }

    if config.decimal_places > 4 {
        return Err(EventDeskError::Config(
            "Decimal places cannot exceed 4".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(EventDeskError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(EventDeskError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
