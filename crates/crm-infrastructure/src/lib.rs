//! # CRM Infrastructure
//!
//! Storage adapters for the repository ports in `crm-core`: PostgreSQL for
//! deployments, an in-process store for development and tests.

pub mod database;
pub mod memory;

use std::sync::Arc;

use tracing::info;

use crm_core::repositories::{LeadRepository, UserRepository};
use crm_core::DomainError;
use crm_shared::config::{DatabaseBackend, DatabaseSettings};

pub use database::{create_pool, run_migrations, PgLeadRepository, PgUserRepository};
pub use memory::{MemoryLeadRepository, MemoryUserRepository};

/// The pair of repositories every service is built from.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub leads: Arc<dyn LeadRepository>,
}

impl Store {
    /// Connect to the configured backend, applying migrations when asked to.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, DomainError> {
        match settings.backend {
            DatabaseBackend::Postgres => {
                let pool = create_pool(settings).await?;
                if settings.run_migrations {
                    run_migrations(&pool).await?;
                }
                info!("Using PostgreSQL store");
                Ok(Self {
                    users: Arc::new(PgUserRepository::new(pool.clone())),
                    leads: Arc::new(PgLeadRepository::new(pool)),
                })
            }
            DatabaseBackend::Memory => {
                info!("Using in-memory store; data is lost on restart");
                Ok(Self::in_memory())
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::new()),
            leads: Arc::new(MemoryLeadRepository::new()),
        }
    }
}
