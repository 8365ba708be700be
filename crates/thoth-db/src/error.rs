//! Database error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("LanceDB error: {0}")]
    LanceDb(String),

    #[error("Arrow error: {0}")]
    Arrow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("duplicate entry: {0}")]
    Duplicate(String),

    #[error("invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidEmbeddingDimension { expected: usize, actual: usize },

    #[error("database not initialized")]
    NotInitialized,

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Secondary-index error from another `IndexPort` implementor (e.g.
    /// the retrieval engine's full-text index) surfaced through the
    /// shared `index_chunks` return type.
    #[error("secondary index error: {0}")]
    SecondaryIndex(String),
}

impl From<lancedb::Error> for DbError {
    fn from(err: lancedb::Error) -> Self {
        DbError::LanceDb(err.to_string())
    }
}

impl From<arrow_schema::ArrowError> for DbError {
    fn from(err: arrow_schema::ArrowError) -> Self {
        DbError::Arrow(err.to_string())
    }
}
