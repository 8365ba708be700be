//! thoth-db — embedded relational+vector store for articles, citations,
//! and chunks.
//!
//! LanceDB over Arrow gives a single embedded engine for both relational
//! lookups (by id, by DOI, by normalized title) and the dense vector
//! search the retrieval engine needs, with no external server to run.
//!
//! # Example
//!
//! ```rust,no_run
//! use thoth_db::{Database, ArticleRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open("./data/thoth.db").await?;
//!     db.initialize().await?;
//!     let articles = ArticleRepository::new(std::sync::Arc::new(db));
//!     Ok(())
//! }
//! ```

pub mod articles;
pub mod chunks;
pub mod citations;
pub mod database;
pub mod error;
pub mod schema;
pub mod schema_arrow;

pub use articles::ArticleRepository;
pub use chunks::ChunkRepository;
pub use citations::CitationRepository;
pub use database::{Database, DatabaseStats};
pub use error::{DbError, Result};
pub use schema::{Article, Chunk, Citation, EMBEDDING_DIM, TABLE_ARTICLES, TABLE_CHUNKS, TABLE_CITATIONS};
