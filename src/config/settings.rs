//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub registration: RegistrationConfig,
    pub payments: PaymentsConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Registration completeness configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationConfig {
    /// Emergency contacts required before preparation can complete
    pub min_emergency_contacts: u32,
}

/// Monetary configuration injected into payment reconciliation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentsConfig {
    pub currency: String,
    pub decimal_places: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub max_files: u32,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("EVENTDESK"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::EventDeskError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/eventdesk".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            registration: RegistrationConfig {
                min_emergency_contacts: 1,
            },
            payments: PaymentsConfig {
                currency: "EUR".to_string(),
                decimal_places: 2,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/eventdesk".to_string(),
                max_files: 5,
            },
        }
    }
}
