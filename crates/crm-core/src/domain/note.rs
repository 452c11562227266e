//! Note entity (embedded in a lead)

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: Uuid,
    pub content: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(content: String, created_by: Uuid) -> Self {
        Self { id: crm_shared::new_id(), content, created_by, created_at: crm_shared::now() }
    }
}

/// Body of note create/edit requests.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NoteInput {
    #[validate(length(max = 5000, message = "note is too long"))]
    pub content: Option<String>,
}

impl NoteInput {
    /// Trimmed, non-empty content.
    pub fn into_content(self) -> Result<String, DomainError> {
        self.validate()?;
        self.content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| DomainError::Validation("Note content is required".to_string()))
    }
}
