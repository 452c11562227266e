//! Domain errors

use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    AccessDenied(String),

    #[error("Lead not found")]
    LeadNotFound,

    #[error("Note not found")]
    NoteNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already in use: {0}")]
    EmailAlreadyExists(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("No leads found")]
    NoLeadsToExport,

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("{0}")]
    Upload(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn access_denied() -> Self {
        DomainError::AccessDenied("Access denied".to_string())
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        DomainError::Validation(messages.join("; "))
    }
}
