//! Dashboard counters

use serde::Serialize;

use super::lead::{Lead, LeadPriority, LeadStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub total: usize,
    pub new: usize,
    pub contacted: usize,
    pub qualified: usize,
    pub closed: usize,
    pub high_priority: usize,
}

impl LeadStats {
    pub fn from_leads<'a>(leads: impl IntoIterator<Item = &'a Lead>) -> Self {
        leads.into_iter().fold(Self::default(), |mut stats, lead| {
            stats.total += 1;
            match lead.status {
                LeadStatus::New => stats.new += 1,
                LeadStatus::Contacted => stats.contacted += 1,
                LeadStatus::Qualified => stats.qualified += 1,
                LeadStatus::Closed => stats.closed += 1,
            }
            if lead.priority == LeadPriority::High {
                stats.high_priority += 1;
            }
            stats
        })
    }
}
