//! Lead access control
//!
//! Callers look the target up first and only then ask for a decision, so an
//! absent lead is always reported as not found rather than forbidden.

use tracing::{debug, warn};
use uuid::Uuid;

use crm_shared::config::AccessSettings;

use crate::domain::{Identity, Lead, Note};
use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadAction {
    View,
    Update,
    Reassign,
    Delete,
    AddNote,
}

impl LeadAction {
    fn as_str(&self) -> &'static str {
        match self {
            LeadAction::View => "view",
            LeadAction::Update => "update",
            LeadAction::Reassign => "reassign",
            LeadAction::Delete => "delete",
            LeadAction::AddNote => "add a note to",
        }
    }
}

/// Lead authorization service
#[derive(Debug, Clone, Copy)]
pub struct LeadAuthorization {
    members_can_create: bool,
    members_can_export: bool,
}

impl LeadAuthorization {
    pub fn new(settings: AccessSettings) -> Self {
        Self {
            members_can_create: settings.members_can_create_leads,
            members_can_export: settings.members_can_export,
        }
    }

    /// Assignee restriction for list, stats and export. `None` means every lead.
    pub fn visibility(&self, identity: &Identity) -> Option<Uuid> {
        if identity.is_admin() {
            None
        } else {
            Some(identity.user_id)
        }
    }

    /// Check if the caller may perform `action` on an existing lead
    pub fn check_access(&self, identity: &Identity, lead: &Lead, action: LeadAction) -> bool {
        if identity.is_admin() {
            return true;
        }
        match action {
            LeadAction::View | LeadAction::Update | LeadAction::AddNote => lead.is_assigned_to(&identity.user_id),
            LeadAction::Reassign | LeadAction::Delete => false,
        }
    }

    /// Enforce lead access (error if denied)
    pub fn require_access(&self, identity: &Identity, lead: &Lead, action: LeadAction) -> Result<(), DomainError> {
        if !self.check_access(identity, lead, action) {
            warn!("User {} denied permission to {} lead {}", identity.user_id, action.as_str(), lead.id);
            return Err(DomainError::access_denied());
        }
        debug!("User {} may {} lead {}", identity.user_id, action.as_str(), lead.id);
        Ok(())
    }

    /// Admins may change any note; members only the notes they wrote.
    pub fn require_note_author(&self, identity: &Identity, note: &Note) -> Result<(), DomainError> {
        if identity.is_admin() || note.created_by == identity.user_id {
            return Ok(());
        }
        warn!("User {} denied change to note {} by {}", identity.user_id, note.id, note.created_by);
        Err(DomainError::AccessDenied("Only the note author can change this note".to_string()))
    }

    pub fn require_create(&self, identity: &Identity) -> Result<(), DomainError> {
        if identity.is_admin() || self.members_can_create {
            return Ok(());
        }
        warn!("User {} denied lead creation", identity.user_id);
        Err(DomainError::AccessDenied("Only admins can create leads".to_string()))
    }

    pub fn require_export(&self, identity: &Identity) -> Result<(), DomainError> {
        if identity.is_admin() || self.members_can_export {
            return Ok(());
        }
        warn!("User {} denied lead export", identity.user_id);
        Err(DomainError::AccessDenied("Only admins can export leads".to_string()))
    }

    pub fn require_admin(&self, identity: &Identity) -> Result<(), DomainError> {
        if identity.is_admin() {
            return Ok(());
        }
        warn!("User {} denied admin-only operation", identity.user_id);
        Err(DomainError::AccessDenied("Admin access required".to_string()))
    }
}
