//! Database connection pool

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{error, info};

use crm_core::DomainError;
use crm_shared::config::DatabaseSettings;

pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_seconds))
        .connect(&settings.url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            DomainError::Database(e.to_string())
        })
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        DomainError::Database(e.to_string())
    })?;
    info!("Database migrations applied");
    Ok(())
}
