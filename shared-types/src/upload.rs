use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One record per ingestion call
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UploadAttempt {
    pub id: i64,
    pub file_name: String,
    pub file_size: i64,
    pub record_count: i64,
    pub uploaded_by: Option<String>,
    pub status: UploadStatus,
    pub error_message: Option<String>,
    pub processing_time_ms: Option<i64>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum UploadStatus {
    Pending,
    Success,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Success => "success",
            UploadStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(UploadStatus::Pending),
            "success" => Some(UploadStatus::Success),
            "failed" => Some(UploadStatus::Failed),
            _ => None,
        }
    }
}

/// A row that failed validation. `row` is 1-based and counts the header line,
/// so the first data row is row 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RowRejection {
    pub row: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AgentShare {
    pub agent_id: i64,
    pub agent_name: String,
    pub contact_count: u64,
}

/// Result of one distribution pass over the full contact set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DistributionSummary {
    pub total_contacts: u64,
    pub agent_count: u64,
    pub unassigned: u64,
    pub shares: Vec<AgentShare>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UploadResponse {
    pub message: String,
    pub total_records: u64,
    pub upload_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<RowRejection>>,
    pub distribution: DistributionSummary,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RedistributeResponse {
    pub message: String,
    pub distribution: DistributionSummary,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UploadHistoryResponse {
    pub uploads: Vec<UploadAttempt>,
}
