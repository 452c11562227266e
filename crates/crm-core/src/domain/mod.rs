//! # CRM Core - Domain Module
//!
//! Domain entities for the CRM application.

pub mod identity;
pub mod lead;
pub mod note;
pub mod stats;
pub mod user;
pub mod view;

pub use identity::Identity;
pub use lead::{Lead, LeadChanges, LeadFilter, LeadFilterParams, LeadInput, LeadPriority, LeadQuery, LeadSource, LeadStatus};
pub use note::{Note, NoteInput};
pub use stats::LeadStats;
pub use user::{ProfileChanges, ProfileInput, Role, User, UserProfile, UserSummary};
pub use view::{LeadView, NoteView, UserRef};
