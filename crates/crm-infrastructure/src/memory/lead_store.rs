use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crm_core::domain::{Lead, LeadChanges, LeadQuery, Note};
use crm_core::error::DomainError;
use crm_core::repositories::LeadRepository;

/// Leads in insertion order, notes embedded.
#[derive(Default)]
pub struct MemoryLeadRepository {
    leads: RwLock<Vec<Lead>>,
}

impl MemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeadRepository for MemoryLeadRepository {
    async fn insert(&self, lead: &Lead) -> Result<Lead, DomainError> {
        let mut leads = self.leads.write().await;
        if leads.iter().any(|l| l.id == lead.id) {
            return Err(DomainError::Internal(format!("duplicate lead id {}", lead.id)));
        }
        leads.push(lead.clone());
        Ok(lead.clone())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Lead>, DomainError> {
        Ok(self.leads.read().await.iter().find(|l| &l.id == id).cloned())
    }

    async fn list(&self, query: &LeadQuery) -> Result<Vec<Lead>, DomainError> {
        Ok(self.leads.read().await.iter().filter(|l| query.matches(l)).cloned().collect())
    }

    async fn update(
        &self,
        id: &Uuid,
        changes: &LeadChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Lead>, DomainError> {
        let mut leads = self.leads.write().await;
        Ok(leads.iter_mut().find(|l| &l.id == id).map(|lead| {
            lead.apply(changes, updated_at);
            lead.clone()
        }))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let mut leads = self.leads.write().await;
        let before = leads.len();
        leads.retain(|l| &l.id != id);
        Ok(leads.len() < before)
    }

    async fn append_note(&self, lead_id: &Uuid, note: &Note) -> Result<bool, DomainError> {
        let mut leads = self.leads.write().await;
        let Some(lead) = leads.iter_mut().find(|l| &l.id == lead_id) else {
            return Ok(false);
        };
        lead.notes.push(note.clone());
        lead.updated_at = note.created_at;
        Ok(true)
    }

    async fn update_note(&self, lead_id: &Uuid, note_id: &Uuid, content: &str) -> Result<bool, DomainError> {
        let mut leads = self.leads.write().await;
        let Some(lead) = leads.iter_mut().find(|l| &l.id == lead_id) else {
            return Ok(false);
        };
        let Some(note) = lead.notes.iter_mut().find(|n| &n.id == note_id) else {
            return Ok(false);
        };
        note.content = content.to_string();
        lead.updated_at = crm_shared::now();
        Ok(true)
    }

    async fn remove_note(&self, lead_id: &Uuid, note_id: &Uuid) -> Result<bool, DomainError> {
        let mut leads = self.leads.write().await;
        let Some(lead) = leads.iter_mut().find(|l| &l.id == lead_id) else {
            return Ok(false);
        };
        let before = lead.notes.len();
        lead.notes.retain(|n| &n.id != note_id);
        if lead.notes.len() == before {
            return Ok(false);
        }
        lead.updated_at = crm_shared::now();
        Ok(true)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
