//! Utility functions

/// Emails are compared and stored trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let keep: String = local.chars().take(if local.chars().count() <= 2 { 1 } else { 2 }).collect();
            format!("{}***@{}", keep, domain)
        }
        None => "***".to_string(),
    }
}

/// Returns `Some(trimmed)` for a non-blank value, `None` otherwise.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
