//! Lead repository trait (port)
//!
//! Note operations are single atomic store operations on one lead; callers
//! never rewrite the whole note list. Each one also refreshes the lead's
//! `updated_at`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Lead, LeadChanges, LeadQuery, Note};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn insert(&self, lead: &Lead) -> Result<Lead, DomainError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Lead>, DomainError>;

    /// Matching leads in creation order, notes included.
    async fn list(&self, query: &LeadQuery) -> Result<Vec<Lead>, DomainError>;

    /// Applies the present fields only. `None` when the lead is gone.
    async fn update(
        &self,
        id: &Uuid,
        changes: &LeadChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Lead>, DomainError>;

    /// Removes the lead and its notes. `false` when nothing was deleted.
    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError>;

    /// Appends to the end of the note list. `false` when the lead is gone.
    async fn append_note(&self, lead_id: &Uuid, note: &Note) -> Result<bool, DomainError>;

    /// Replaces one note's content. `false` when the lead or note is gone.
    async fn update_note(&self, lead_id: &Uuid, note_id: &Uuid, content: &str) -> Result<bool, DomainError>;

    /// Removes one note, leaving its siblings' ids and order intact.
    async fn remove_note(&self, lead_id: &Uuid, note_id: &Uuid) -> Result<bool, DomainError>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<(), DomainError>;
}
