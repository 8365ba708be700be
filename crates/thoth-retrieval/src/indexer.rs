//! Second `IndexPort` implementation (spec §4.4): composes the
//! ingestion pipeline's LanceDB write with a BM25 update over the same
//! chunks, and optional contextual enrichment before both.

use std::sync::Arc;

use async_trait::async_trait;
use thoth_db::{ChunkRepository, Database};
use thoth_ingestion::repository::IndexPort;
use thoth_llm::LlmBackend;
use uuid::Uuid;

use crate::context_enrichment::enrich_chunks;
use crate::fulltext::FullTextIndex;

/// Indexes chunks into both the dense vector store and the full-text
/// index, enriching each chunk with a short LLM-generated context
/// prefix first when enrichment is enabled.
pub struct RetrievalIndexer {
    chunks: ChunkRepository,
    fulltext: Arc<FullTextIndex>,
    llm: Option<Arc<dyn LlmBackend>>,
}

impl RetrievalIndexer {
    pub fn new(db: Arc<Database>, fulltext: Arc<FullTextIndex>, llm: Option<Arc<dyn LlmBackend>>) -> Self {
        Self { chunks: ChunkRepository::new(db), fulltext, llm }
    }
}

#[async_trait]
impl IndexPort for RetrievalIndexer {
    async fn index_chunks(&self, paper_id: Uuid, chunks: Vec<thoth_db::Chunk>) -> thoth_db::Result<()> {
        let chunks = match &self.llm {
            Some(llm) => enrich_chunks(llm.as_ref(), chunks).await,
            None => chunks,
        };

        self.chunks.delete_by_paper_id(paper_id).await?;
        self.chunks.insert_batch(&chunks).await?;

        let fulltext_rows: Vec<(Uuid, String)> = chunks
            .iter()
            .map(|c| (c.id, c.context.clone().unwrap_or_else(|| c.content.clone())))
            .collect();

        self.fulltext
            .upsert_chunks(&fulltext_rows)
            .map_err(|e| thoth_db::DbError::SecondaryIndex(e.to_string()))?;

        Ok(())
    }
}
