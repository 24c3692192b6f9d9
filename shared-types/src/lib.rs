use serde::{Deserialize, Serialize};

pub mod agent;
pub mod contact;
pub mod dashboard;
pub mod error;
pub mod upload;

pub use agent::{
    Agent, AgentDistribution, AgentStatus, AgentsResponse, CreateAgentRequest,
    DistributionResponse, UpdateAgentRequest,
};
pub use contact::{
    BulkUpdateContactsRequest, BulkUpdateContactsResponse, Contact, ContactStatus,
    ContactsResponse, NewContact, UpdateContactRequest,
};
pub use dashboard::{AgentTotals, ContactTotals, DashboardStats};
pub use error::{ListError, RosterError};
pub use upload::{
    AgentShare, DistributionSummary, RedistributeResponse, RowRejection, UploadAttempt,
    UploadHistoryResponse, UploadResponse, UploadStatus,
};

/// Error response for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RowRejection>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: Vec::new(),
        }
    }
}
