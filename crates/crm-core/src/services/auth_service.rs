// ============================================================================
// CRM Core - Authentication Service
// File: crates/crm-core/src/services/auth_service.rs
// ============================================================================
//! Registration, login and bearer-token authentication

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crm_security::{JwtError, JwtService, PasswordError, PasswordService, TokenSubject};
use crm_shared::utils::{mask_email, normalize_email};

use crate::domain::{Identity, Role, User, UserProfile};
use crate::error::DomainError;
use crate::repositories::UserRepository;

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Result of successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: UserProfile,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    /// Register a new member account
    pub async fn register(&self, input: RegisterInput) -> Result<UserProfile, DomainError> {
        let name = required(input.name, "Name")?;
        let email = normalize_email(&required(input.email, "Email")?);
        let password = input.password.unwrap_or_default();

        info!("Registration attempt for email: {}", mask_email(&email));
        PasswordService::check_policy(&password).map_err(password_error)?;

        if self.users.find_by_email(&email).await?.is_some() {
            warn!("Registration failed: email already exists: {}", mask_email(&email));
            return Err(DomainError::EmailAlreadyExists(email));
        }

        let user = self.create_account(&name, &email, &password, Role::Member).await?;
        info!("Registration successful for user {}", user.id);
        Ok(user.profile())
    }

    /// Login with email and password
    pub async fn login(&self, input: LoginInput) -> Result<LoginResult, DomainError> {
        let email = normalize_email(input.email.as_deref().unwrap_or_default());
        let password = input.password.unwrap_or_default();
        if email.is_empty() || password.is_empty() {
            return Err(DomainError::Validation("Email and password are required".to_string()));
        }

        let user = self.users.find_by_email(&email).await?.ok_or_else(|| {
            warn!("Login failed: email not found: {}", mask_email(&email));
            DomainError::InvalidCredentials
        })?;

        let valid = PasswordService::verify(&password, &user.password_hash).map_err(|e| {
            error!("Stored password hash for user {} is unreadable: {}", user.id, e);
            DomainError::InvalidCredentials
        })?;
        if !valid {
            warn!("Login failed: invalid password for: {}", mask_email(&email));
            return Err(DomainError::InvalidCredentials);
        }

        let token = self
            .jwt
            .generate_access_token(TokenSubject {
                user_id: &user.id,
                role: user.role.as_str(),
                name: &user.name,
                email: &user.email,
            })
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        info!("Login successful for user {}", user.id);
        Ok(LoginResult { token, user: user.profile() })
    }

    /// Resolve a bearer token to the caller's current identity.
    ///
    /// Role and name come from the stored account, not from the claims.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, DomainError> {
        let claims = self.jwt.validate_token(token).map_err(|e| match e {
            JwtError::TokenExpired => DomainError::Unauthenticated("Token has expired".to_string()),
            other => {
                warn!("Rejected bearer token: {}", other);
                DomainError::Unauthenticated("Invalid token".to_string())
            }
        })?;
        let user_id = claims
            .user_id()
            .map_err(|_| DomainError::Unauthenticated("Invalid token".to_string()))?;

        match self.users.find_by_id(&user_id).await? {
            Some(user) => Ok(Identity::from(&user)),
            None => {
                warn!("Token subject {} no longer exists", user_id);
                Err(DomainError::Unauthenticated("User no longer exists".to_string()))
            }
        }
    }

    /// Create the configured admin account unless its email is already taken.
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<(), DomainError> {
        let email = normalize_email(email);
        if let Some(existing) = self.users.find_by_email(&email).await? {
            if !existing.is_admin() {
                warn!("Bootstrap admin email {} belongs to a member account", mask_email(&email));
            }
            return Ok(());
        }

        PasswordService::check_policy(password).map_err(password_error)?;
        let admin = self.create_account(name, &email, password, Role::Admin).await?;
        info!("Bootstrap admin {} created", admin.id);
        Ok(())
    }

    async fn create_account(&self, name: &str, email: &str, password: &str, role: Role) -> Result<User, DomainError> {
        let hash = PasswordService::hash(password).map_err(password_error)?;
        let user = User::new(name, email, hash, role)?;
        self.users.create(&user).await
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, DomainError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::Validation(format!("{} is required", field)))
}

fn password_error(e: PasswordError) -> DomainError {
    match e {
        PasswordError::HashError(msg) => DomainError::Internal(msg),
        policy => DomainError::Validation(policy.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockUserRepository;
    use std::sync::Mutex;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn service(users: MockUserRepository) -> AuthService {
        AuthService::new(Arc::new(users), JwtService::new(SECRET, 3600))
    }

    fn stored(email: &str, password: &str, role: Role) -> User {
        User::new("Ann", email, PasswordService::hash(password).unwrap(), role).unwrap()
    }

    #[tokio::test]
    async fn test_register_creates_member_with_hashed_password() {
        let saved: Arc<Mutex<Option<User>>> = Arc::new(Mutex::new(None));
        let sink = saved.clone();

        let mut users = MockUserRepository::new();
        users.expect_find_by_email().withf(|email| email == "ann@x.com").returning(|_| Ok(None));
        users.expect_create().times(1).returning(move |u| {
            *sink.lock().unwrap() = Some(u.clone());
            Ok(u.clone())
        });

        let profile = service(users)
            .register(RegisterInput {
                name: Some("Ann".into()),
                email: Some(" Ann@X.com ".into()),
                password: Some("secret1".into()),
            })
            .await
            .unwrap();

        assert_eq!(profile.email, "ann@x.com");
        assert_eq!(profile.role, Role::Member);
        let user = saved.lock().unwrap().clone().unwrap();
        assert_ne!(user.password_hash, "secret1");
        assert!(PasswordService::verify("secret1", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(User::new("Ann", email, "hash".into(), Role::Member).unwrap())));
        users.expect_create().times(0);

        let result = service(users)
            .register(RegisterInput {
                name: Some("Other".into()),
                email: Some("ANN@x.com".into()),
                password: Some("secret1".into()),
            })
            .await;
        assert!(matches!(result, Err(DomainError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_register_enforces_password_policy() {
        let mut users = MockUserRepository::new();
        users.expect_create().times(0);

        let result = service(users)
            .register(RegisterInput {
                name: Some("Ann".into()),
                email: Some("ann@x.com".into()),
                password: Some("123".into()),
            })
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let user = stored("ann@x.com", "secret1", Role::Member);
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(move |email| {
            Ok((email == "ann@x.com").then(|| user.clone()))
        });
        let svc = service(users);

        let wrong_password = svc
            .login(LoginInput { email: Some("ann@x.com".into()), password: Some("nope".into()) })
            .await
            .unwrap_err();
        let unknown_email = svc
            .login(LoginInput { email: Some("bob@x.com".into()), password: Some("secret1".into()) })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, DomainError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_authenticate_uses_stored_role() {
        let user = stored("ann@x.com", "secret1", Role::Member);
        let login_user = user.clone();
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(move |_| Ok(Some(login_user.clone())));

        // Promoted after the token was issued.
        let mut promoted = user.clone();
        promoted.role = Role::Admin;
        users.expect_find_by_id().returning(move |_| Ok(Some(promoted.clone())));

        let svc = service(users);
        let login = svc
            .login(LoginInput { email: Some("ann@x.com".into()), password: Some("secret1".into()) })
            .await
            .unwrap();
        let identity = svc.authenticate(&login.token).await.unwrap();

        assert_eq!(identity.user_id, user.id);
        assert!(identity.is_admin());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_deleted_user_and_garbage() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let svc = service(users);

        let id = uuid::Uuid::new_v4();
        let token = JwtService::new(SECRET, 3600)
            .generate_access_token(TokenSubject { user_id: &id, role: "admin", name: "Ghost", email: "g@x.com" })
            .unwrap();

        assert!(matches!(svc.authenticate(&token).await, Err(DomainError::Unauthenticated(_))));
        assert!(matches!(svc.authenticate("not-a-jwt").await, Err(DomainError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(User::new("Admin", email, "hash".into(), Role::Admin).unwrap())));
        users.expect_create().times(0);

        service(users).ensure_admin("Admin", "admin@x.com", "secret1").await.unwrap();
    }
}
