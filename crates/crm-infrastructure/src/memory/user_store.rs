use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crm_core::domain::{ProfileChanges, User};
use crm_core::error::DomainError;
use crm_core::repositories::UserRepository;

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &[User], email: &str, except: Option<&Uuid>) -> bool {
    users
        .iter()
        .any(|u| u.email.eq_ignore_ascii_case(email) && Some(&u.id) != except)
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().await.iter().find(|u| &u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, DomainError> {
        Ok(self.users.read().await.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        Ok(self.users.read().await.clone())
    }

    async fn create(&self, user: &User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        if email_taken(&users, &user.email, None) {
            return Err(DomainError::EmailAlreadyExists(user.email.clone()));
        }
        users.push(user.clone());
        Ok(user.clone())
    }

    async fn update_profile(&self, id: &Uuid, changes: &ProfileChanges) -> Result<Option<User>, DomainError> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if email_taken(&users, email, Some(id)) {
                return Err(DomainError::EmailAlreadyExists(email.clone()));
            }
        }

        let Some(user) = users.iter_mut().find(|u| &u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        user.updated_at = crm_shared::now();
        Ok(Some(user.clone()))
    }
}
