//! User domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crm_shared::utils::{non_blank, normalize_email};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            // Older accounts were stored with role "user".
            "member" | "user" => Some(Role::Member),
            _ => None,
        }
    }
}

/// Account record. Deliberately not `Serialize`: the password hash must
/// only leave the store through [`UserProfile`]-style projections.
#[derive(Debug, Clone, Validate)]
pub struct User {
    pub id: Uuid,

    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,

    #[validate(email(message = "email must be a valid address"))]
    pub email: String,

    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: &str, email: &str, password_hash: String, role: Role) -> Result<Self, DomainError> {
        let now = crm_shared::now();
        let user = Self {
            id: crm_shared::new_id(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary { id: self.id, name: self.name.clone(), email: self.email.clone() }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Display fields used when resolving references to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Public view of an account; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a self-service profile update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct ProfileChanges {
    #[validate(length(max = 100, message = "name is too long"))]
    pub name: Option<String>,

    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
}

impl ProfileInput {
    /// Blank fields are ignored rather than clearing the stored value.
    pub fn into_changes(self) -> Result<ProfileChanges, DomainError> {
        let changes = ProfileChanges {
            name: non_blank(self.name.as_deref()),
            email: non_blank(self.email.as_deref()).map(|e| normalize_email(&e)),
        };
        changes.validate()?;
        Ok(changes)
    }
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::parse_name("admin"), Some(Role::Admin));
        assert_eq!(Role::parse_name("Member"), Some(Role::Member));
        assert_eq!(Role::parse_name("user"), Some(Role::Member));
        assert_eq!(Role::parse_name("root"), None);
        assert_eq!(Role::default(), Role::Member);
    }

    #[test]
    fn test_new_user_normalizes_email() {
        let user = User::new(" Ann ", " Ann@X.com ", "hash".into(), Role::Member).unwrap();
        assert_eq!(user.name, "Ann");
        assert_eq!(user.email, "ann@x.com");
        assert!(!user.is_admin());
    }

    #[test]
    fn test_new_user_rejects_bad_input() {
        assert!(matches!(
            User::new("", "ann@x.com", "hash".into(), Role::Member),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            User::new("Ann", "not-an-email", "hash".into(), Role::Member),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_profile_never_serializes_password() {
        let user = User::new("Ann", "ann@x.com", "secret-hash".into(), Role::Admin).unwrap();
        let json = serde_json::to_string(&user.profile()).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"role\":\"admin\""));
        assert!(json.contains("createdAt"));
    }

    #[test]
    fn test_profile_input_ignores_blank_fields() {
        let changes = ProfileInput { name: Some("  ".into()), email: Some(" B@X.com".into()) }
            .into_changes()
            .unwrap();
        assert_eq!(changes.name, None);
        assert_eq!(changes.email.as_deref(), Some("b@x.com"));
    }

    #[test]
    fn test_profile_input_rejects_invalid_email() {
        let result = ProfileInput { name: None, email: Some("nope".into()) }.into_changes();
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
