// ============================================================================
// CRM Core - Lead Service
// File: crates/crm-core/src/services/lead_service.rs
// ============================================================================
//! Lead CRUD, notes, stats and export.
//!
//! Every operation loads the target first (404), then asks
//! [`LeadAuthorization`] (403), then validates and mutates.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::view::referenced_user_ids;
use crate::domain::{
    Identity, Lead, LeadFilter, LeadInput, LeadQuery, LeadStats, LeadView, Note, NoteInput, UserSummary,
};
use crate::error::DomainError;
use crate::repositories::{LeadRepository, UserRepository};
use crate::services::authorization::{LeadAction, LeadAuthorization};
use crate::services::csv_export::render_leads_csv;

pub struct LeadService {
    leads: Arc<dyn LeadRepository>,
    users: Arc<dyn UserRepository>,
    authz: LeadAuthorization,
}

impl LeadService {
    pub fn new(leads: Arc<dyn LeadRepository>, users: Arc<dyn UserRepository>, authz: LeadAuthorization) -> Self {
        Self { leads, users, authz }
    }

    pub async fn create_lead(&self, identity: &Identity, input: LeadInput) -> Result<LeadView, DomainError> {
        self.authz.require_create(identity)?;
        let lead = input.into_new_lead(identity.user_id)?;

        if let Some(assignee) = lead.assigned_to.filter(|id| id != &identity.user_id) {
            self.authz.require_access(identity, &lead, LeadAction::Reassign)?;
            self.ensure_user_exists(&assignee).await?;
        }

        let created = self.leads.insert(&lead).await?;
        info!("Lead {} created by {}", created.id, identity.user_id);
        self.view(created).await
    }

    pub async fn list_leads(&self, identity: &Identity, filter: LeadFilter) -> Result<Vec<LeadView>, DomainError> {
        let query = LeadQuery::new(self.authz.visibility(identity), filter);
        let leads = self.leads.list(&query).await?;
        self.views(leads).await
    }

    pub async fn get_lead(&self, identity: &Identity, id: &Uuid) -> Result<LeadView, DomainError> {
        let lead = self.load(id).await?;
        self.authz.require_access(identity, &lead, LeadAction::View)?;
        self.view(lead).await
    }

    pub async fn update_lead(&self, identity: &Identity, id: &Uuid, input: LeadInput) -> Result<LeadView, DomainError> {
        let lead = self.load(id).await?;
        self.authz.require_access(identity, &lead, LeadAction::Update)?;
        let changes = input.into_changes()?;

        if let Some(assignee) = changes.assigned_to.filter(|a| !lead.is_assigned_to(a)) {
            self.authz.require_access(identity, &lead, LeadAction::Reassign)?;
            self.ensure_user_exists(&assignee).await?;
            info!("Lead {} reassigned to {} by {}", lead.id, assignee, identity.user_id);
        }

        let updated = self
            .leads
            .update(id, &changes, crm_shared::now())
            .await?
            .ok_or(DomainError::LeadNotFound)?;
        self.view(updated).await
    }

    pub async fn delete_lead(&self, identity: &Identity, id: &Uuid) -> Result<(), DomainError> {
        let lead = self.load(id).await?;
        self.authz.require_access(identity, &lead, LeadAction::Delete)?;

        if !self.leads.delete(id).await? {
            return Err(DomainError::LeadNotFound);
        }
        info!("Lead {} deleted by {} ({} notes removed)", id, identity.user_id, lead.notes.len());
        Ok(())
    }

    pub async fn add_note(&self, identity: &Identity, id: &Uuid, input: NoteInput) -> Result<LeadView, DomainError> {
        let content = input.into_content()?;
        let lead = self.load(id).await?;
        self.authz.require_access(identity, &lead, LeadAction::AddNote)?;

        let note = Note::new(content, identity.user_id);
        if !self.leads.append_note(id, &note).await? {
            return Err(DomainError::LeadNotFound);
        }
        info!("Note {} added to lead {} by {}", note.id, id, identity.user_id);
        self.view(self.load(id).await?).await
    }

    pub async fn edit_note(
        &self,
        identity: &Identity,
        id: &Uuid,
        note_id: &Uuid,
        input: NoteInput,
    ) -> Result<LeadView, DomainError> {
        let content = input.into_content()?;
        self.authorize_note_change(identity, id, note_id).await?;

        if !self.leads.update_note(id, note_id, &content).await? {
            return Err(DomainError::NoteNotFound);
        }
        info!("Note {} on lead {} edited by {}", note_id, id, identity.user_id);
        self.view(self.load(id).await?).await
    }

    pub async fn delete_note(&self, identity: &Identity, id: &Uuid, note_id: &Uuid) -> Result<LeadView, DomainError> {
        self.authorize_note_change(identity, id, note_id).await?;

        if !self.leads.remove_note(id, note_id).await? {
            return Err(DomainError::NoteNotFound);
        }
        info!("Note {} on lead {} deleted by {}", note_id, id, identity.user_id);
        self.view(self.load(id).await?).await
    }

    pub async fn lead_stats(&self, identity: &Identity) -> Result<LeadStats, DomainError> {
        let query = LeadQuery::new(self.authz.visibility(identity), LeadFilter::default());
        let leads = self.leads.list(&query).await?;
        Ok(LeadStats::from_leads(&leads))
    }

    /// CSV text of the visible leads matching `filter`; `NoLeadsToExport` when empty.
    pub async fn export_csv(&self, identity: &Identity, filter: LeadFilter) -> Result<String, DomainError> {
        self.authz.require_export(identity)?;
        let query = LeadQuery::new(self.authz.visibility(identity), filter);
        let leads = self.leads.list(&query).await?;
        if leads.is_empty() {
            return Err(DomainError::NoLeadsToExport);
        }

        let count = leads.len();
        let views = self.views(leads).await?;
        let csv = render_leads_csv(&views)?;
        info!("Exported {} leads for {}", count, identity.user_id);
        Ok(csv)
    }

    pub async fn ping(&self) -> Result<(), DomainError> {
        self.leads.ping().await
    }

    async fn load(&self, id: &Uuid) -> Result<Lead, DomainError> {
        self.leads.find_by_id(id).await?.ok_or(DomainError::LeadNotFound)
    }

    /// Lead and note must exist; the caller must be the note's author or an
    /// admin, whoever the lead is currently assigned to.
    async fn authorize_note_change(&self, identity: &Identity, id: &Uuid, note_id: &Uuid) -> Result<(), DomainError> {
        let lead = self.load(id).await?;
        let note = lead.note(note_id).ok_or(DomainError::NoteNotFound)?;
        self.authz.require_note_author(identity, note)
    }

    async fn ensure_user_exists(&self, id: &Uuid) -> Result<(), DomainError> {
        match self.users.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => {
                warn!("Rejected assignment to unknown user {}", id);
                Err(DomainError::Validation(format!("assignedTo {} does not reference an existing user", id)))
            }
        }
    }

    async fn user_directory(&self, leads: &[Lead]) -> Result<HashMap<Uuid, UserSummary>, DomainError> {
        let ids = referenced_user_ids(leads);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = self.users.find_by_ids(&ids).await?;
        Ok(users.into_iter().map(|u| (u.id, u.summary())).collect())
    }

    async fn view(&self, lead: Lead) -> Result<LeadView, DomainError> {
        let users = self.user_directory(std::slice::from_ref(&lead)).await?;
        Ok(LeadView::resolve(lead, &users))
    }

    async fn views(&self, leads: Vec<Lead>) -> Result<Vec<LeadView>, DomainError> {
        let users = self.user_directory(&leads).await?;
        Ok(leads.into_iter().map(|lead| LeadView::resolve(lead, &users)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LeadStatus, Role, User};
    use crate::repositories::{MockLeadRepository, MockUserRepository};
    use crm_shared::config::AccessSettings;
    use std::sync::Mutex;

    fn identity(role: Role) -> Identity {
        Identity { user_id: Uuid::new_v4(), role, name: "tester".into() }
    }

    fn user(id: Uuid, name: &str) -> User {
        let mut user = User::new(name, &format!("{}@x.com", name.to_lowercase()), "hash".into(), Role::Member).unwrap();
        user.id = id;
        user
    }

    fn lead_for(assignee: Uuid) -> Lead {
        LeadInput {
            name: Some("Ann".into()),
            email: Some("ann@x.com".into()),
            phone: Some("555".into()),
            ..Default::default()
        }
        .into_new_lead(assignee)
        .unwrap()
    }

    fn service(leads: MockLeadRepository, users: MockUserRepository) -> LeadService {
        let authz = LeadAuthorization::new(AccessSettings { members_can_create_leads: false, members_can_export: true });
        LeadService::new(Arc::new(leads), Arc::new(users), authz)
    }

    fn users_returning(known: Vec<User>) -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users.expect_find_by_ids().returning(move |ids| {
            Ok(known.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
        });
        users
    }

    #[tokio::test]
    async fn test_missing_lead_is_not_found_for_any_role() {
        for role in [Role::Admin, Role::Member] {
            let mut leads = MockLeadRepository::new();
            leads.expect_find_by_id().returning(|_| Ok(None));
            let svc = service(leads, MockUserRepository::new());

            let result = svc.get_lead(&identity(role), &Uuid::new_v4()).await;
            assert!(matches!(result, Err(DomainError::LeadNotFound)));
        }
    }

    #[tokio::test]
    async fn test_get_by_non_assignee_is_denied() {
        let lead = lead_for(Uuid::new_v4());
        let mut leads = MockLeadRepository::new();
        leads.expect_find_by_id().returning(move |_| Ok(Some(lead.clone())));
        let svc = service(leads, MockUserRepository::new());

        let result = svc.get_lead(&identity(Role::Member), &Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_create_with_bogus_status_persists_nothing() {
        let mut leads = MockLeadRepository::new();
        leads.expect_insert().times(0);
        let svc = service(leads, MockUserRepository::new());

        let input = LeadInput {
            name: Some("Ann".into()),
            email: Some("ann@x.com".into()),
            phone: Some("555".into()),
            status: Some("Bogus".into()),
            ..Default::default()
        };
        let result = svc.create_lead(&identity(Role::Admin), input).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_assignee() {
        let mut leads = MockLeadRepository::new();
        leads.expect_insert().times(0);
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let svc = service(leads, users);

        let input = LeadInput {
            name: Some("Ann".into()),
            email: Some("ann@x.com".into()),
            phone: Some("555".into()),
            assigned_to: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let result = svc.create_lead(&identity(Role::Admin), input).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_member_create_is_denied_by_default() {
        let mut leads = MockLeadRepository::new();
        leads.expect_insert().times(0);
        let svc = service(leads, MockUserRepository::new());

        let result = svc.create_lead(&identity(Role::Member), LeadInput::default()).await;
        assert!(matches!(result, Err(DomainError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_forbidden_update_is_reported_before_validation() {
        let lead = lead_for(Uuid::new_v4());
        let mut leads = MockLeadRepository::new();
        leads.expect_find_by_id().returning(move |_| Ok(Some(lead.clone())));
        leads.expect_update().times(0);
        let svc = service(leads, MockUserRepository::new());

        let input = LeadInput { status: Some("Bogus".into()), ..Default::default() };
        let result = svc.update_lead(&identity(Role::Member), &Uuid::new_v4(), input).await;
        assert!(matches!(result, Err(DomainError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_assignee_cannot_reassign() {
        let member = identity(Role::Member);
        let lead = lead_for(member.user_id);
        let mut leads = MockLeadRepository::new();
        leads.expect_find_by_id().returning(move |_| Ok(Some(lead.clone())));
        leads.expect_update().times(0);
        let svc = service(leads, MockUserRepository::new());

        let input = LeadInput { assigned_to: Some(Uuid::new_v4()), ..Default::default() };
        let result = svc.update_lead(&member, &Uuid::new_v4(), input).await;
        assert!(matches!(result, Err(DomainError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_admin_update_passes_changes_to_store() {
        let admin = identity(Role::Admin);
        let lead = lead_for(admin.user_id);
        let lead_id = lead.id;
        let stored = lead.clone();
        let mut leads = MockLeadRepository::new();
        leads.expect_find_by_id().returning(move |_| Ok(Some(stored.clone())));
        leads
            .expect_update()
            .withf(move |id, changes, _| *id == lead_id && changes.status == Some(LeadStatus::Closed) && changes.name.is_none())
            .times(1)
            .returning(move |_, changes, at| {
                let mut updated = lead.clone();
                updated.apply(changes, at);
                Ok(Some(updated))
            });
        let svc = service(leads, users_returning(vec![]));

        let input = LeadInput { status: Some("Closed".into()), ..Default::default() };
        let view = svc.update_lead(&admin, &lead_id, input).await.unwrap();
        assert_eq!(view.status, LeadStatus::Closed);
        assert_eq!(view.name, "Ann");
    }

    #[tokio::test]
    async fn test_add_note_appends_atomically_and_resolves_author() {
        let member = identity(Role::Member);
        let state = Arc::new(Mutex::new(lead_for(member.user_id)));
        let lead_id = state.lock().unwrap().id;

        let mut leads = MockLeadRepository::new();
        let reader = state.clone();
        leads.expect_find_by_id().returning(move |_| Ok(Some(reader.lock().unwrap().clone())));
        let writer = state.clone();
        leads.expect_append_note().times(1).returning(move |_, note| {
            writer.lock().unwrap().notes.push(note.clone());
            Ok(true)
        });
        let svc = service(leads, users_returning(vec![user(member.user_id, "Mia")]));

        let view = svc
            .add_note(&member, &lead_id, NoteInput { content: Some("called".into()) })
            .await
            .unwrap();

        let last = view.notes.last().unwrap();
        assert_eq!(last.content, "called");
        assert_eq!(last.created_by.id, member.user_id);
        assert_eq!(last.created_by.name.as_deref(), Some("Mia"));
    }

    #[tokio::test]
    async fn test_empty_note_is_rejected_before_store_access() {
        let mut leads = MockLeadRepository::new();
        leads.expect_find_by_id().times(0);
        leads.expect_append_note().times(0);
        let svc = service(leads, MockUserRepository::new());

        let result = svc.add_note(&identity(Role::Admin), &Uuid::new_v4(), NoteInput { content: Some(" ".into()) }).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_assignee_cannot_edit_teammates_note() {
        let member = identity(Role::Member);
        let mut lead = lead_for(member.user_id);
        let note = Note::new("by someone else".into(), Uuid::new_v4());
        let (lead_id, note_id) = (lead.id, note.id);
        lead.notes.push(note);

        let mut leads = MockLeadRepository::new();
        leads.expect_find_by_id().returning(move |_| Ok(Some(lead.clone())));
        leads.expect_update_note().times(0);
        let svc = service(leads, MockUserRepository::new());

        let result = svc
            .edit_note(&member, &lead_id, &note_id, NoteInput { content: Some("mine now".into()) })
            .await;
        assert!(matches!(result, Err(DomainError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_author_keeps_note_rights_after_reassignment() {
        let author = identity(Role::Member);
        let mut lead = lead_for(Uuid::new_v4());
        let note = Note::new("written before handover".into(), author.user_id);
        let (lead_id, note_id) = (lead.id, note.id);
        lead.notes.push(note);

        let mut leads = MockLeadRepository::new();
        leads.expect_find_by_id().returning(move |_| Ok(Some(lead.clone())));
        leads.expect_update_note().times(1).returning(|_, _, _| Ok(true));
        leads.expect_remove_note().times(1).returning(|_, _| Ok(true));
        let svc = service(leads, users_returning(vec![]));

        let edited = svc
            .edit_note(&author, &lead_id, &note_id, NoteInput { content: Some("still mine".into()) })
            .await;
        assert!(edited.is_ok());
        assert!(svc.delete_note(&author, &lead_id, &note_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_unknown_note_is_not_found() {
        let admin = identity(Role::Admin);
        let lead = lead_for(admin.user_id);
        let lead_id = lead.id;
        let mut leads = MockLeadRepository::new();
        leads.expect_find_by_id().returning(move |_| Ok(Some(lead.clone())));
        leads.expect_remove_note().times(0);
        let svc = service(leads, MockUserRepository::new());

        let result = svc.delete_note(&admin, &lead_id, &Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::NoteNotFound)));
    }

    #[tokio::test]
    async fn test_member_delete_is_denied() {
        let member = identity(Role::Member);
        let lead = lead_for(member.user_id);
        let mut leads = MockLeadRepository::new();
        leads.expect_find_by_id().returning(move |_| Ok(Some(lead.clone())));
        leads.expect_delete().times(0);
        let svc = service(leads, MockUserRepository::new());

        let result = svc.delete_lead(&member, &Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_list_restricts_members_to_their_leads() {
        let member = identity(Role::Member);
        let expected = member.user_id;
        let mut leads = MockLeadRepository::new();
        leads
            .expect_list()
            .withf(move |q| q.assigned_to == Some(expected))
            .times(1)
            .returning(|_| Ok(vec![]));
        let svc = service(leads, MockUserRepository::new());

        assert!(svc.list_leads(&member, LeadFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut leads = MockLeadRepository::new();
        leads.expect_list().returning(|_| Err(DomainError::Database("connection reset".into())));
        let svc = service(leads, MockUserRepository::new());

        let result = svc.list_leads(&identity(Role::Admin), LeadFilter::default()).await;
        assert!(matches!(result, Err(DomainError::Database(_))));
    }

    #[tokio::test]
    async fn test_export_of_empty_set_is_distinct_error() {
        let mut leads = MockLeadRepository::new();
        leads.expect_list().returning(|_| Ok(vec![]));
        let svc = service(leads, MockUserRepository::new());

        let result = svc.export_csv(&identity(Role::Admin), LeadFilter::default()).await;
        assert!(matches!(result, Err(DomainError::NoLeadsToExport)));
    }

    #[tokio::test]
    async fn test_stats_count_visible_leads() {
        let admin = identity(Role::Admin);
        let mut leads = MockLeadRepository::new();
        leads
            .expect_list()
            .withf(|q| q.assigned_to.is_none())
            .returning(|_| Ok(vec![lead_for(Uuid::new_v4()), lead_for(Uuid::new_v4())]));
        let svc = service(leads, MockUserRepository::new());

        let stats = svc.lead_stats(&admin).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.new, 2);
    }
}
