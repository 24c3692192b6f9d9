use crate::upload::RowRejection;

/// Terminal failures of a single list ingestion
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("Unsupported file format '{0}'. Only CSV, XLS, and XLSX are supported.")]
    UnsupportedFormat(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("{message}")]
    ValidationEmpty {
        message: String,
        rejections: Vec<RowRejection>,
    },

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl ListError {
    /// Failures caused by the uploaded file rather than by storage
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ListError::PersistenceFailure(_))
    }
}

/// Failures of agent and contact management operations
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("Agent {0} not found")]
    AgentNotFound(i64),

    #[error("Contact {0} not found")]
    ContactNotFound(i64),

    #[error("Agent {0} is inactive and cannot receive contacts")]
    InactiveAgent(i64),

    #[error("Agent with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

