use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssessError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Transaction data unavailable: {0}")]
    DataUnavailable(String),

    #[error("External service '{service}' timed out after {timeout_ms}ms")]
    ExternalServiceTimeout { service: String, timeout_ms: u64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AssessResult<T> = Result<T, AssessError>;
