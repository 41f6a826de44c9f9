//! EventDesk registration engine
//!
//! Main application entry point: loads configuration, prepares the database
//! and verifies the deployment is ready to serve the form and webhook
//! collaborators.

use tracing::info;

use EventDesk::{
    config::Settings,
    utils::logging,
    database::{DatabaseService, connection},
    services::ServiceFactory,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    logging::init_logging(&settings.logging)?;

    info!("Starting {}...", EventDesk::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_config = connection::DatabaseConfig {
        url: settings.database.url.clone(),
        max_connections: settings.database.max_connections,
        min_connections: settings.database.min_connections,
        ..connection::DatabaseConfig::default()
    };
    let db_pool = connection::create_pool(&db_config).await?;

    // Run database migrations
    connection::run_migrations(&db_pool).await?;

    // Initialize the database and service layers
    let database_service = DatabaseService::new(db_pool.clone());
    let _services = ServiceFactory::new(&settings, database_service);

    // Verify the deployment before reporting ready
    connection::health_check(&db_pool).await?;

    info!(
        currency = %settings.payments.currency,
        min_emergency_contacts = settings.registration.min_emergency_contacts,
        "EventDesk is ready"
    );

    Ok(())
}
