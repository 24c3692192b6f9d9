use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::contact::Contact;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Agent {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub status: AgentStatus,
    /// Cached count of contacts assigned to this agent. Rewritten from the
    /// contact table after every assignment change.
    pub contact_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum AgentStatus {
    #[default]
    Active,
    Inactive,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(AgentStatus::Active),
            "inactive" => Some(AgentStatus::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct CreateAgentRequest {
    pub name: String,
    pub email: String,
    pub mobile: String,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export)]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub status: Option<AgentStatus>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AgentsResponse {
    pub agents: Vec<Agent>,
}

/// An active agent together with the contacts currently assigned to it
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AgentDistribution {
    pub agent_id: i64,
    pub name: String,
    pub email: String,
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DistributionResponse {
    pub agents: Vec<AgentDistribution>,
    pub unassigned_count: u64,
}
