// ============================================================================
// CRM Infrastructure - PostgreSQL Lead Repository
// File: crates/crm-infrastructure/src/database/postgres/lead_repo_impl.rs
// ============================================================================
//! Leads live in `leads`, their notes in `lead_notes` ordered by `seq`.
//! Every note mutation runs in one transaction with the `updated_at` bump.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crm_core::domain::{Lead, LeadChanges, LeadPriority, LeadQuery, LeadSource, LeadStatus, Note};
use crm_core::error::DomainError;
use crm_core::repositories::LeadRepository;

use super::database_error;

const LEAD_COLUMNS: &str =
    "id, name, email, phone, company, source, status, priority, assigned_to, created_at, updated_at";

pub struct PgLeadRepository {
    pool: PgPool,
}

impl PgLeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn notes_for(&self, lead_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Note>>, DomainError> {
        let rows: Vec<NoteRow> = sqlx::query_as(
            r#"
            SELECT id, lead_id, content, created_by, created_at
            FROM lead_notes
            WHERE lead_id = ANY($1)
            ORDER BY seq
            "#,
        )
        .bind(lead_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("loading notes", e))?;

        let mut grouped: HashMap<Uuid, Vec<Note>> = HashMap::new();
        for row in rows {
            grouped.entry(row.lead_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    async fn with_notes(&self, rows: Vec<LeadRow>) -> Result<Vec<Lead>, DomainError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut notes = self.notes_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let lead_notes = notes.remove(&row.id).unwrap_or_default();
                row.into_lead(lead_notes)
            })
            .collect())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool.begin().await.map_err(|e| database_error("starting transaction", e))
    }
}

/// Bumps `updated_at`; `false` when the lead does not exist.
async fn touch(tx: &mut Transaction<'_, Postgres>, lead_id: &Uuid, at: DateTime<Utc>) -> Result<bool, DomainError> {
    let result = sqlx::query("UPDATE leads SET updated_at = $2 WHERE id = $1")
        .bind(lead_id)
        .bind(at)
        .execute(&mut **tx)
        .await
        .map_err(|e| database_error("touching lead", e))?;
    Ok(result.rows_affected() > 0)
}

async fn commit(tx: Transaction<'_, Postgres>) -> Result<(), DomainError> {
    tx.commit().await.map_err(|e| database_error("committing transaction", e))
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct LeadRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    company: String,
    source: String,
    status: String,
    priority: String,
    assigned_to: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LeadRow {
    fn into_lead(self, notes: Vec<Note>) -> Lead {
        Lead {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            source: LeadSource::parse_name(&self.source).unwrap_or_default(),
            status: LeadStatus::parse_name(&self.status).unwrap_or_default(),
            priority: LeadPriority::parse_name(&self.priority).unwrap_or_default(),
            assigned_to: self.assigned_to,
            notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct NoteRow {
    id: Uuid,
    lead_id: Uuid,
    content: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Note { id: row.id, content: row.content, created_by: row.created_by, created_at: row.created_at }
    }
}

#[async_trait]
impl LeadRepository for PgLeadRepository {
    async fn insert(&self, lead: &Lead) -> Result<Lead, DomainError> {
        let row: LeadRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO leads (
                id, name, email, phone, company,
                source, status, priority, assigned_to,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            LEAD_COLUMNS
        ))
        .bind(lead.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(lead.source.as_str())
        .bind(lead.status.as_str())
        .bind(lead.priority.as_str())
        .bind(lead.assigned_to)
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| database_error("creating lead", e))?;

        info!("Lead stored: {}", row.id);
        Ok(row.into_lead(Vec::new()))
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Lead>, DomainError> {
        let row: Option<LeadRow> = sqlx::query_as(&format!("SELECT {} FROM leads WHERE id = $1", LEAD_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("finding lead", e))?;

        Ok(self.with_notes(row.into_iter().collect()).await?.pop())
    }

    async fn list(&self, query: &LeadQuery) -> Result<Vec<Lead>, DomainError> {
        let rows: Vec<LeadRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM leads
            WHERE ($1::uuid IS NULL OR assigned_to = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR priority = $3)
            ORDER BY seq
            "#,
            LEAD_COLUMNS
        ))
        .bind(query.assigned_to)
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.priority.map(|p| p.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("listing leads", e))?;

        debug!("Lead query matched {} rows", rows.len());
        self.with_notes(rows).await
    }

    async fn update(
        &self,
        id: &Uuid,
        changes: &LeadChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Lead>, DomainError> {
        let row: Option<LeadRow> = sqlx::query_as(&format!(
            r#"
            UPDATE leads
            SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                company = COALESCE($5, company),
                source = COALESCE($6, source),
                status = COALESCE($7, status),
                priority = COALESCE($8, priority),
                assigned_to = COALESCE($9, assigned_to),
                updated_at = $10
            WHERE id = $1
            RETURNING {}
            "#,
            LEAD_COLUMNS
        ))
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.phone.as_deref())
        .bind(changes.company.as_deref())
        .bind(changes.source.map(|s| s.as_str()))
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.priority.map(|p| p.as_str()))
        .bind(changes.assigned_to)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("updating lead", e))?;

        Ok(self.with_notes(row.into_iter().collect()).await?.pop())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("deleting lead", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_note(&self, lead_id: &Uuid, note: &Note) -> Result<bool, DomainError> {
        let mut tx = self.begin().await?;
        if !touch(&mut tx, lead_id, note.created_at).await? {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO lead_notes (id, lead_id, content, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(note.id)
        .bind(lead_id)
        .bind(&note.content)
        .bind(note.created_by)
        .bind(note.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| database_error("adding note", e))?;

        commit(tx).await?;
        Ok(true)
    }

    async fn update_note(&self, lead_id: &Uuid, note_id: &Uuid, content: &str) -> Result<bool, DomainError> {
        let mut tx = self.begin().await?;
        let result = sqlx::query("UPDATE lead_notes SET content = $3 WHERE id = $2 AND lead_id = $1")
            .bind(lead_id)
            .bind(note_id)
            .bind(content)
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error("editing note", e))?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        touch(&mut tx, lead_id, crm_shared::now()).await?;
        commit(tx).await?;
        Ok(true)
    }

    async fn remove_note(&self, lead_id: &Uuid, note_id: &Uuid) -> Result<bool, DomainError> {
        let mut tx = self.begin().await?;
        let result = sqlx::query("DELETE FROM lead_notes WHERE id = $2 AND lead_id = $1")
            .bind(lead_id)
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error("deleting note", e))?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        touch(&mut tx, lead_id, crm_shared::now()).await?;
        commit(tx).await?;
        Ok(true)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("pinging database", e))?;
        Ok(())
    }
}
