//! Citation repository.
//!
//! Provides CRUD operations for citation edges between articles (spec
//! §3.1 Citation, §3.2 citation-graph ownership).

use crate::database::Database;
use crate::error::Result;
use crate::schema::Citation;
use crate::schema_arrow::{citation_to_record, record_to_citation};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;

#[derive(Clone)]
pub struct CitationRepository {
    db: Arc<Database>,
}

impl CitationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn insert(&self, citation: &Citation) -> Result<()> {
        let table = self.db.connection().open_table(crate::schema::TABLE_CITATIONS).execute().await?;
        let record = citation_to_record(citation)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);
        table.add(iter).execute().await?;
        Ok(())
    }

    pub async fn insert_batch(&self, citations: &[Citation]) -> Result<()> {
        if citations.is_empty() {
            return Ok(());
        }
        let table = self.db.connection().open_table(crate::schema::TABLE_CITATIONS).execute().await?;
        let records: Vec<arrow_array::RecordBatch> = citations.iter().map(citation_to_record).collect::<Result<_>>()?;
        let schema = records[0].schema();
        let iter = arrow_array::RecordBatchIterator::new(records.into_iter().map(Ok), schema);
        table.add(iter).execute().await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: uuid::Uuid) -> Result<Option<Citation>> {
        let table = self.db.connection().open_table(crate::schema::TABLE_CITATIONS).execute().await?;
        let mut stream = table.query().only_if(&format!("id = '{}'", id)).execute().await?;
        if let Some(batch) = stream.next().await {
            let batch = batch?;
            if batch.num_rows() > 0 {
                return Ok(Some(record_to_citation(&batch, 0)?));
            }
        }
        Ok(None)
    }

    /// All citations a given article makes (outgoing edges).
    pub async fn find_by_source(&self, source_article_id: uuid::Uuid) -> Result<Vec<Citation>> {
        self.find_many(&format!("source_article_id = '{}'", source_article_id)).await
    }

    /// All citations that resolved to a given article (incoming edges).
    pub async fn find_by_target(&self, target_article_id: uuid::Uuid) -> Result<Vec<Citation>> {
        self.find_many(&format!("target_article_id = '{}'", target_article_id)).await
    }

    pub async fn find_unresolved(&self) -> Result<Vec<Citation>> {
        self.find_many("target_article_id IS NULL").await
    }

    async fn find_many(&self, filter: &str) -> Result<Vec<Citation>> {
        let table = self.db.connection().open_table(crate::schema::TABLE_CITATIONS).execute().await?;
        let mut stream = table.query().only_if(filter).execute().await?;
        let mut citations = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                citations.push(record_to_citation(&batch, i)?);
            }
        }
        Ok(citations)
    }

    /// Resolve a citation to a target article. Resolution is monotonic
    /// (spec §3.1): callers must not clear an already-set
    /// `target_article_id`; this method only ever sets it.
    pub async fn resolve(&self, citation: &Citation) -> Result<()> {
        let table = self.db.connection().open_table(crate::schema::TABLE_CITATIONS).execute().await?;
        let record = citation_to_record(citation)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);
        let mut builder = table.merge_insert(&["id"]);
        builder.when_matched_update_all(None);
        builder.execute(Box::new(iter)).await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let table = self.db.connection().open_table(crate::schema::TABLE_CITATIONS).execute().await?;
        Ok(table.count_rows(None).await? as u64)
    }
}
