//! CSV rendering for lead exports

use chrono::SecondsFormat;
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crm_shared::constants::EXPORT_HEADER;

use crate::domain::LeadView;
use crate::error::DomainError;

/// Renders the fixed header followed by one fully quoted row per lead.
/// Embedded quotes are doubled.
pub fn render_leads_csv(leads: &[LeadView]) -> Result<String, DomainError> {
    let mut head = EXPORT_HEADER.join(",");
    head.push('\n');

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(head.into_bytes());

    for lead in leads {
        let assigned = lead.assigned_to.as_ref().map(|u| u.display_name()).unwrap_or("");
        let created_at = lead.created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        writer
            .write_record([
                lead.name.as_str(),
                lead.email.as_str(),
                lead.phone.as_str(),
                lead.company.as_str(),
                lead.status.as_str(),
                lead.priority.as_str(),
                assigned,
                created_at.as_str(),
            ])
            .map_err(|e| DomainError::Internal(format!("CSV export failed: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DomainError::Internal(format!("CSV export failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| DomainError::Internal(format!("CSV export failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LeadInput, UserSummary};
    use std::collections::HashMap;
    use uuid::Uuid;

    fn view(name: &str, company: &str, assignee: Option<&UserSummary>) -> LeadView {
        let owner = assignee.map(|u| u.id).unwrap_or_else(Uuid::new_v4);
        let lead = LeadInput {
            name: Some(name.into()),
            email: Some("ann@x.com".into()),
            phone: Some("555".into()),
            company: Some(company.into()),
            priority: Some("High".into()),
            ..Default::default()
        }
        .into_new_lead(owner)
        .unwrap();
        let users: HashMap<Uuid, UserSummary> = assignee.map(|u| (u.id, u.clone())).into_iter().collect();
        LeadView::resolve(lead, &users)
    }

    #[test]
    fn test_header_is_unquoted_and_rows_are_quoted() {
        let owner = UserSummary { id: Uuid::new_v4(), name: "Bob".into(), email: "bob@x.com".into() };
        let lead = view("Ann", "Acme", Some(&owner));
        let created = lead.created_at.to_rfc3339_opts(SecondsFormat::Millis, true);

        let csv = render_leads_csv(&[lead]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Name,Email,Phone,Company,Status,Priority,Assigned To,Created At");
        assert_eq!(
            lines[1],
            format!("\"Ann\",\"ann@x.com\",\"555\",\"Acme\",\"New\",\"High\",\"Bob\",\"{}\"", created)
        );
        assert_eq!(lines.len(), 2);
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn test_unresolved_assignee_renders_empty() {
        let csv = render_leads_csv(&[view("Ann", "", None)]).unwrap();
        assert!(csv.lines().nth(1).unwrap().contains(",\"\",\"High\",\"\","));
    }

    #[test]
    fn test_embedded_quotes_and_commas_are_escaped() {
        let csv = render_leads_csv(&[view("Ann \"The Closer\"", "Acme, Inc.", None)]).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("\"Ann \"\"The Closer\"\"\""));
        assert!(row.contains("\"Acme, Inc.\""));
    }

    #[test]
    fn test_empty_input_yields_header_only() {
        assert_eq!(render_leads_csv(&[]).unwrap().lines().count(), 1);
    }
}
