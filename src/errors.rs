use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Input was considered invalid due to error: {0}")]
    InvalidInput(#[from] anyhow::Error),
    #[error("Insufficient data to estimate an energy baseline: {0}")]
    InsufficientData(String),
    #[error("Utility data could not be imported: {}", .0.join("; "))]
    UtilityImport(Vec<String>),
    #[error("No audit record found with id {0}")]
    RecordNotFound(Uuid),
    #[error("Error writing output: {0}")]
    Output(OutputError),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct OutputError {
    error: anyhow::Error,
}

impl OutputError {
    pub fn new(error: anyhow::Error) -> Self {
        Self { error }
    }
}

impl From<OutputError> for AuditError {
    fn from(error: OutputError) -> Self {
        AuditError::Output(error)
    }
}
