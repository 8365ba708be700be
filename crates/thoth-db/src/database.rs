//! Database connection and table management.
//!
//! Provides a unified interface for LanceDB operations.

use crate::error::Result;
use crate::schema;
use arrow_array::RecordBatchIterator;
use std::path::Path;

/// Main database handle.
#[derive(Clone)]
pub struct Database {
    conn: lancedb::connection::Connection,
    path: String,
}

impl Database {
    /// Open or create a database at the specified path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        if !path.as_ref().exists() {
            std::fs::create_dir_all(path.as_ref())?;
        }

        let conn = lancedb::connect(&path_str).execute().await?;

        Ok(Self { conn, path: path_str })
    }

    pub fn connection(&self) -> &lancedb::connection::Connection {
        &self.conn
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Create every table that doesn't exist yet.
    pub async fn initialize(&self) -> Result<()> {
        if !self.table_exists(schema::TABLE_ARTICLES).await? {
            self.create_table_with_schema(schema::TABLE_ARTICLES, crate::schema_arrow::article_schema()).await?;
        }
        if !self.table_exists(schema::TABLE_CITATIONS).await? {
            self.create_table_with_schema(schema::TABLE_CITATIONS, crate::schema_arrow::citation_schema()).await?;
        }
        if !self.table_exists(schema::TABLE_CHUNKS).await? {
            self.create_table_with_schema(schema::TABLE_CHUNKS, crate::schema_arrow::chunk_schema()).await?;
        }
        Ok(())
    }

    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let tables = self.conn.table_names().execute().await?;
        Ok(tables.contains(&name.to_string()))
    }

    async fn create_table_with_schema(&self, name: &str, schema: std::sync::Arc<arrow_schema::Schema>) -> Result<()> {
        let empty_iter = RecordBatchIterator::new(vec![], schema);
        self.conn.create_table(name, empty_iter).execute().await?;
        Ok(())
    }

    /// Create a vector index on the chunks table's embedding column.
    /// Requires a nontrivial row count to be effective; safe to call on an
    /// empty table (LanceDB falls back to brute force until then).
    pub async fn create_vector_index(&self) -> Result<()> {
        let table = self.conn.open_table(schema::TABLE_CHUNKS).execute().await?;
        table.create_index(&["embedding"], lancedb::index::Index::Auto).execute().await?;
        Ok(())
    }

    pub async fn optimize(&self) -> Result<()> {
        let tables = self.conn.table_names().execute().await?;
        for table_name in tables {
            let table = self.conn.open_table(&table_name).execute().await?;
            table.optimize(lancedb::table::OptimizeAction::default()).await?;
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<DatabaseStats> {
        let count_of = |name: &'static str| {
            let conn = self.conn.clone();
            async move {
                let table = conn.open_table(name).execute().await?;
                Result::Ok(table.count_rows(None).await? as u64)
            }
        };

        let articles = if self.table_exists(schema::TABLE_ARTICLES).await? { count_of(schema::TABLE_ARTICLES).await? } else { 0 };
        let citations = if self.table_exists(schema::TABLE_CITATIONS).await? { count_of(schema::TABLE_CITATIONS).await? } else { 0 };
        let chunks = if self.table_exists(schema::TABLE_CHUNKS).await? { count_of(schema::TABLE_CHUNKS).await? } else { 0 };

        Ok(DatabaseStats { articles, citations, chunks })
    }
}

/// Database statistics.
#[derive(Debug, Clone, Default)]
pub struct DatabaseStats {
    pub articles: u64,
    pub citations: u64,
    pub chunks: u64,
}
