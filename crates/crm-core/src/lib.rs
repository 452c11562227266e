//! # CRM Core
//!
//! Domain entities, access policy, services, and repository traits for the CRM.

pub mod domain;
pub mod error;
pub mod repositories;
pub mod services;

pub use domain::*;
pub use error::DomainError;
