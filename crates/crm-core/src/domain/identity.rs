//! Resolved caller identity

use uuid::Uuid;

use super::user::{Role, User};

/// The authenticated caller, rebuilt from the user store on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
    pub name: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self { user_id: user.id, role: user.role, name: user.name.clone() }
    }
}
