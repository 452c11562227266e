//! User repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ProfileChanges, User};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError>;

    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Users among `ids`; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, DomainError>;

    /// All users in registration order.
    async fn list(&self) -> Result<Vec<User>, DomainError>;

    /// Fails with `EmailAlreadyExists` on a duplicate email.
    async fn create(&self, user: &User) -> Result<User, DomainError>;

    /// Returns `None` when the user does not exist.
    async fn update_profile(&self, id: &Uuid, changes: &ProfileChanges) -> Result<Option<User>, DomainError>;
}
