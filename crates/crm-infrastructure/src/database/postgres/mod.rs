//! PostgreSQL repository implementations

pub mod lead_repo_impl;
pub mod user_repo_impl;

pub use lead_repo_impl::PgLeadRepository;
pub use user_repo_impl::PgUserRepository;

use crm_core::DomainError;
use tracing::error;

fn database_error(action: &str, e: sqlx::Error) -> DomainError {
    error!("Database error {}: {}", action, e);
    DomainError::Database(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error().is_some_and(|db| db.is_unique_violation())
}
