use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("query not found: {0}")]
    NotFound(String),

    #[error("invalid query name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Llm(#[from] thoth_llm::LlmError),

    #[error(transparent)]
    Gateway(#[from] thoth_common::ThothError),

    #[error("failed to acquire decision log lock")]
    LockFailed,
}

pub type Result<T> = std::result::Result<T, QueryError>;
