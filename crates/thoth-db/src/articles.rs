//! Article repository.
//!
//! Provides CRUD operations for the citation graph's article table
//! (spec §3.2: the citation graph exclusively owns Article rows).

use crate::database::Database;
use crate::error::Result;
use crate::schema::Article;
use crate::schema_arrow::{article_to_record, record_to_article};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;

/// Repository for article operations.
#[derive(Clone)]
pub struct ArticleRepository {
    db: Arc<Database>,
}

impl ArticleRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn insert(&self, article: &Article) -> Result<()> {
        let table = self.db.connection().open_table(crate::schema::TABLE_ARTICLES).execute().await?;
        let record = article_to_record(article)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);
        table.add(iter).execute().await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: uuid::Uuid) -> Result<Option<Article>> {
        let table = self.db.connection().open_table(crate::schema::TABLE_ARTICLES).execute().await?;
        let mut stream = table.query().only_if(&format!("id = '{}'", id)).execute().await?;
        if let Some(batch) = stream.next().await {
            let batch = batch?;
            if batch.num_rows() > 0 {
                return Ok(Some(record_to_article(&batch, 0)?));
            }
        }
        Ok(None)
    }

    pub async fn find_by_doi(&self, doi: &str) -> Result<Option<Article>> {
        let escaped = doi.replace('\'', "''");
        self.find_one(&format!("doi = '{}'", escaped)).await
    }

    pub async fn find_by_arxiv_id(&self, arxiv_id: &str) -> Result<Option<Article>> {
        let escaped = arxiv_id.replace('\'', "''");
        self.find_one(&format!("arxiv_id = '{}'", escaped)).await
    }

    pub async fn find_by_normalized_title(&self, normalized_title: &str) -> Result<Option<Article>> {
        let escaped = normalized_title.replace('\'', "''");
        self.find_one(&format!("normalized_title = '{}'", escaped)).await
    }

    async fn find_one(&self, filter: &str) -> Result<Option<Article>> {
        let table = self.db.connection().open_table(crate::schema::TABLE_ARTICLES).execute().await?;
        let mut stream = table.query().only_if(filter).execute().await?;
        if let Some(batch) = stream.next().await {
            let batch = batch?;
            if batch.num_rows() > 0 {
                return Ok(Some(record_to_article(&batch, 0)?));
            }
        }
        Ok(None)
    }

    /// Replace an article's row by id. LanceDB has no in-place update, so
    /// writes go through `merge_insert` keyed on `id` (same pattern the
    /// chunk repository uses).
    pub async fn update(&self, article: &Article) -> Result<()> {
        let table = self.db.connection().open_table(crate::schema::TABLE_ARTICLES).execute().await?;
        let record = article_to_record(article)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);
        let mut builder = table.merge_insert(&["id"]);
        builder.when_matched_update_all(None);
        builder.execute(Box::new(iter)).await?;
        Ok(())
    }

    pub async fn delete(&self, id: uuid::Uuid) -> Result<()> {
        let table = self.db.connection().open_table(crate::schema::TABLE_ARTICLES).execute().await?;
        table.delete(&format!("id = '{}'", id)).await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let table = self.db.connection().open_table(crate::schema::TABLE_ARTICLES).execute().await?;
        Ok(table.count_rows(None).await? as u64)
    }

    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Article>> {
        let table = self.db.connection().open_table(crate::schema::TABLE_ARTICLES).execute().await?;
        let mut stream = table.query().limit(limit).offset(offset).execute().await?;
        let mut articles = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                articles.push(record_to_article(&batch, i)?);
            }
        }
        Ok(articles)
    }
}
