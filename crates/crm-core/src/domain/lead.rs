// ============================================================================
// CRM Core - Lead Entity
// File: crates/crm-core/src/domain/lead.rs
// Description: Lead entity, classification enums and create/update inputs
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crm_shared::utils::normalize_email;

use super::note::Note;
use crate::error::DomainError;

/// Where a lead came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadSource {
    Website,
    Referral,
    #[serde(rename = "Social Media")]
    SocialMedia,
    #[default]
    Other,
}

impl LeadSource {
    pub const ALL: [LeadSource; 4] =
        [LeadSource::Website, LeadSource::Referral, LeadSource::SocialMedia, LeadSource::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::Website => "Website",
            LeadSource::Referral => "Referral",
            LeadSource::SocialMedia => "Social Media",
            LeadSource::Other => "Other",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

/// Pipeline stage. Any value may follow any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Closed,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 4] =
        [LeadStatus::New, LeadStatus::Contacted, LeadStatus::Qualified, LeadStatus::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::Closed => "Closed",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl LeadPriority {
    pub const ALL: [LeadPriority; 3] = [LeadPriority::High, LeadPriority::Medium, LeadPriority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadPriority::High => "High",
            LeadPriority::Medium => "Medium",
            LeadPriority::Low => "Low",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

fn parse_field<T: Copy>(
    field: &str,
    raw: Option<&str>,
    parse: fn(&str) -> Option<T>,
    accepted: &[&str],
) -> Result<Option<T>, DomainError> {
    match raw {
        None => Ok(None),
        Some(value) => parse(value).map(Some).ok_or_else(|| {
            DomainError::Validation(format!(
                "{} must be one of {}, got '{}'",
                field,
                accepted.join(", "),
                value
            ))
        }),
    }
}

fn parse_source(raw: Option<&str>) -> Result<Option<LeadSource>, DomainError> {
    let accepted: Vec<&str> = LeadSource::ALL.iter().map(|v| v.as_str()).collect();
    parse_field("source", raw, LeadSource::parse_name, &accepted)
}

fn parse_status(raw: Option<&str>) -> Result<Option<LeadStatus>, DomainError> {
    let accepted: Vec<&str> = LeadStatus::ALL.iter().map(|v| v.as_str()).collect();
    parse_field("status", raw, LeadStatus::parse_name, &accepted)
}

fn parse_priority(raw: Option<&str>) -> Result<Option<LeadPriority>, DomainError> {
    let accepted: Vec<&str> = LeadPriority::ALL.iter().map(|v| v.as_str()).collect();
    parse_field("priority", raw, LeadPriority::parse_name, &accepted)
}

/// Lead entity. Owns its notes; `assigned_to` is a weak reference to a user.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct Lead {
    pub id: Uuid,

    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,

    #[validate(email(message = "email must be a valid address"))]
    pub email: String,

    #[validate(length(min = 1, max = 50, message = "phone is required"))]
    pub phone: String,

    #[validate(length(max = 200, message = "company is too long"))]
    pub company: String,

    pub source: LeadSource,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    pub assigned_to: Option<Uuid>,
    pub notes: Vec<Note>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn is_assigned_to(&self, user_id: &Uuid) -> bool {
        self.assigned_to.as_ref() == Some(user_id)
    }

    pub fn note(&self, note_id: &Uuid) -> Option<&Note> {
        self.notes.iter().find(|n| &n.id == note_id)
    }

    /// In-memory form of the partial update the stores apply.
    pub fn apply(&mut self, changes: &LeadChanges, updated_at: DateTime<Utc>) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(email) = &changes.email {
            self.email = email.clone();
        }
        if let Some(phone) = &changes.phone {
            self.phone = phone.clone();
        }
        if let Some(company) = &changes.company {
            self.company = company.clone();
        }
        if let Some(source) = changes.source {
            self.source = source;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(assigned_to) = changes.assigned_to {
            self.assigned_to = Some(assigned_to);
        }
        self.updated_at = updated_at;
    }
}

/// JSON body accepted by create and update. Enum fields arrive as text so
/// that unknown values surface as validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<Uuid>,
}

fn required(field: &str, value: Option<String>) -> Result<String, DomainError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::Validation(format!("{} is required", field)))
}

impl LeadInput {
    /// Builds a new lead. `default_assignee` is used when the body names none.
    pub fn into_new_lead(self, default_assignee: Uuid) -> Result<Lead, DomainError> {
        let now = crm_shared::now();
        let lead = Lead {
            id: crm_shared::new_id(),
            name: required("name", self.name)?,
            email: normalize_email(&required("email", self.email)?),
            phone: required("phone", self.phone)?,
            company: self.company.map(|c| c.trim().to_string()).unwrap_or_default(),
            source: parse_source(self.source.as_deref())?.unwrap_or_default(),
            status: parse_status(self.status.as_deref())?.unwrap_or_default(),
            priority: parse_priority(self.priority.as_deref())?.unwrap_or_default(),
            assigned_to: Some(self.assigned_to.unwrap_or(default_assignee)),
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        lead.validate()?;
        Ok(lead)
    }

    /// Builds a partial update; absent fields stay untouched.
    pub fn into_changes(self) -> Result<LeadChanges, DomainError> {
        let changes = LeadChanges {
            name: self.name.map(|v| v.trim().to_string()),
            email: self.email.map(|v| normalize_email(&v)),
            phone: self.phone.map(|v| v.trim().to_string()),
            company: self.company.map(|v| v.trim().to_string()),
            source: parse_source(self.source.as_deref())?,
            status: parse_status(self.status.as_deref())?,
            priority: parse_priority(self.priority.as_deref())?,
            assigned_to: self.assigned_to,
        };
        changes.validate()?;
        Ok(changes)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct LeadChanges {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 50, message = "phone must not be empty"))]
    pub phone: Option<String>,

    #[validate(length(max = 200, message = "company is too long"))]
    pub company: Option<String>,

    pub source: Option<LeadSource>,
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
    pub assigned_to: Option<Uuid>,
}

/// Optional exact-match filters from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadFilterParams {
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
}

impl LeadFilterParams {
    /// Empty query values (`?status=`) mean "no filter".
    pub fn into_filter(self) -> Result<LeadFilter, DomainError> {
        let status = self.status.filter(|s| !s.trim().is_empty());
        let priority = self.priority.filter(|s| !s.trim().is_empty());
        Ok(LeadFilter {
            status: parse_status(status.as_deref())?,
            priority: parse_priority(priority.as_deref())?,
        })
    }
}

/// Store-level query: the visibility restriction plus user filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadQuery {
    pub assigned_to: Option<Uuid>,
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
}

impl LeadQuery {
    pub fn new(assigned_to: Option<Uuid>, filter: LeadFilter) -> Self {
        Self { assigned_to, status: filter.status, priority: filter.priority }
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        self.assigned_to.map_or(true, |id| lead.is_assigned_to(&id))
            && self.status.map_or(true, |s| lead.status == s)
            && self.priority.map_or(true, |p| lead.priority == p)
    }
}
