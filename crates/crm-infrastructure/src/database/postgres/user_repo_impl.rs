// ============================================================================
// CRM Infrastructure - PostgreSQL User Repository
// File: crates/crm-infrastructure/src/database/postgres/user_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crm_core::domain::{ProfileChanges, Role, User};
use crm_core::error::DomainError;
use crm_core::repositories::UserRepository;

use super::{database_error, is_unique_violation};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: Role::parse_name(&row.role).unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("finding user by id", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE LOWER(email) = LOWER($1)", USER_COLUMNS))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("finding user by email", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, DomainError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS))
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("resolving users", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users ORDER BY seq", USER_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("listing users", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, user: &User) -> Result<User, DomainError> {
        let row: UserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::EmailAlreadyExists(user.email.clone())
            } else {
                database_error("creating user", e)
            }
        })?;

        info!("User created: {}", row.id);
        Ok(row.into())
    }

    async fn update_profile(&self, id: &Uuid, changes: &ProfileChanges) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_at = $4
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(crm_shared::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::EmailAlreadyExists(changes.email.clone().unwrap_or_default())
            } else {
                database_error("updating user profile", e)
            }
        })?;

        Ok(row.map(Into::into))
    }
}
