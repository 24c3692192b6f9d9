use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::upload::{AgentShare, UploadAttempt};

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AgentTotals {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactTotals {
    pub total: u64,
    pub by_status: HashMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub agents: AgentTotals,
    pub contacts: ContactTotals,
    pub distribution: Vec<AgentShare>,
    pub recent_uploads: Vec<UploadAttempt>,
}
