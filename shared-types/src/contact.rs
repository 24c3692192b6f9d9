use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Contact {
    pub id: i64,
    pub first_name: String,
    pub phone: String,
    pub notes: String,
    pub status: ContactStatus,
    /// Lookup key only; the agent may have been deleted since.
    pub assigned_agent_id: Option<i64>,
    pub assigned_agent_name: Option<String>,
    pub last_contacted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS, PartialEq, Eq, Hash)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum ContactStatus {
    #[default]
    New,
    Contacted,
    Converted,
    Rejected,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 4] = [
        ContactStatus::New,
        ContactStatus::Contacted,
        ContactStatus::Converted,
        ContactStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::Contacted => "contacted",
            ContactStatus::Converted => "converted",
            ContactStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// A validated row from an uploaded list, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub first_name: String,
    pub phone: String,
    pub notes: String,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export)]
pub struct UpdateContactRequest {
    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub status: Option<ContactStatus>,
    pub assigned_agent_id: Option<i64>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct BulkUpdateContactsRequest {
    pub contact_ids: Vec<i64>,
    pub status: Option<ContactStatus>,
    pub assigned_agent_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkUpdateContactsResponse {
    pub updated: u64,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactsResponse {
    pub contacts: Vec<Contact>,
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ContactStatus::ALL {
            assert_eq!(ContactStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ContactStatus::parse("archived"), None);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&ContactStatus::Contacted).unwrap();
        assert_eq!(json, "\"contacted\"");
    }
}
