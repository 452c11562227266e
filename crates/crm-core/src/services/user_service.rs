//! User directory and self-service profile

use std::sync::Arc;

use tracing::{info, warn};

use crm_shared::utils::mask_email;

use crate::domain::{Identity, ProfileInput, UserProfile};
use crate::error::DomainError;
use crate::repositories::UserRepository;
use crate::services::authorization::LeadAuthorization;

pub struct UserService {
    users: Arc<dyn UserRepository>,
    authz: LeadAuthorization,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, authz: LeadAuthorization) -> Self {
        Self { users, authz }
    }

    /// All accounts, admin only.
    pub async fn list_users(&self, identity: &Identity) -> Result<Vec<UserProfile>, DomainError> {
        self.authz.require_admin(identity)?;
        let users = self.users.list().await?;
        Ok(users.iter().map(|u| u.profile()).collect())
    }

    pub async fn get_profile(&self, identity: &Identity) -> Result<UserProfile, DomainError> {
        self.users
            .find_by_id(&identity.user_id)
            .await?
            .map(|u| u.profile())
            .ok_or(DomainError::UserNotFound)
    }

    pub async fn update_profile(&self, identity: &Identity, input: ProfileInput) -> Result<UserProfile, DomainError> {
        let changes = input.into_changes()?;
        if changes.is_empty() {
            return self.get_profile(identity).await;
        }

        if let Some(email) = &changes.email {
            if let Some(owner) = self.users.find_by_email(email).await? {
                if owner.id != identity.user_id {
                    warn!("Profile update rejected: {} is taken", mask_email(email));
                    return Err(DomainError::EmailAlreadyExists(email.clone()));
                }
            }
        }

        let user = self
            .users
            .update_profile(&identity.user_id, &changes)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        info!("Profile updated for user {}", user.id);
        Ok(user.profile())
    }
}
