use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("full-text index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    #[error("query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),

    #[error(transparent)]
    Db(#[from] thoth_db::DbError),

    #[error(transparent)]
    Llm(#[from] thoth_llm::LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
