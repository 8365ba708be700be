use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to acquire queue lock")]
    LockFailed,
    #[error("no message found for sender '{sender}' -> receiver '{receiver}' at {timestamp}")]
    NotFound { sender: String, receiver: String, timestamp: String },
}

pub type Result<T> = std::result::Result<T, CoordinationError>;
