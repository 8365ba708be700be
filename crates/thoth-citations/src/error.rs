use thiserror::Error;

#[derive(Debug, Error)]
pub enum CitationGraphError {
    #[error("database error: {0}")]
    Db(#[from] thoth_db::DbError),

    #[error("unknown article id: {0}")]
    UnknownArticle(uuid::Uuid),
}

pub type Result<T> = std::result::Result<T, CitationGraphError>;
