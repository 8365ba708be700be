use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error(transparent)]
    Thoth(#[from] thoth_common::ThothError),

    #[error(transparent)]
    Db(#[from] thoth_db::DbError),

    #[error(transparent)]
    Tracker(#[from] thoth_tracker::ledger::TrackerError),

    #[error(transparent)]
    Citation(#[from] thoth_citations::CitationGraphError),

    #[error(transparent)]
    Llm(#[from] thoth_llm::LlmError),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestionError>;
