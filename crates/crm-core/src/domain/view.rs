//! Response shapes with user references resolved to display fields

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::lead::{Lead, LeadPriority, LeadSource, LeadStatus};
use super::note::Note;
use super::user::UserSummary;

/// A user reference. `name`/`email` are absent when the user no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserRef {
    fn resolve(id: Uuid, users: &HashMap<Uuid, UserSummary>) -> Self {
        match users.get(&id) {
            Some(user) => Self { id, name: Some(user.name.clone()), email: Some(user.email.clone()) },
            None => Self { id, name: None, email: None },
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: Uuid,
    pub content: String,
    pub created_by: UserRef,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    pub assigned_to: Option<UserRef>,
    pub notes: Vec<NoteView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeadView {
    pub fn resolve(lead: Lead, users: &HashMap<Uuid, UserSummary>) -> Self {
        let notes = lead
            .notes
            .into_iter()
            .map(|note: Note| NoteView {
                id: note.id,
                content: note.content,
                created_by: UserRef::resolve(note.created_by, users),
                created_at: note.created_at,
            })
            .collect();

        Self {
            id: lead.id,
            name: lead.name,
            email: lead.email,
            phone: lead.phone,
            company: lead.company,
            source: lead.source,
            status: lead.status,
            priority: lead.priority,
            assigned_to: lead.assigned_to.map(|id| UserRef::resolve(id, users)),
            notes,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        }
    }
}

/// Every user id a set of leads refers to, deduplicated.
pub fn referenced_user_ids<'a>(leads: impl IntoIterator<Item = &'a Lead>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = leads
        .into_iter()
        .flat_map(|lead| lead.assigned_to.into_iter().chain(lead.notes.iter().map(|n| n.created_by)))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
