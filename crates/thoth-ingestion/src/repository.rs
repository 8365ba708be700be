//! Chunk persistence seam (spec §3.2: "the retrieval engine exclusively
//! owns Chunk rows... ingestion notifies it via an index-paper
//! operation"). `IndexPort` is the notification interface; today its
//! only implementation writes straight to `thoth-db`'s `ChunkRepository`
//! since the retrieval engine's own index has no separate store yet —
//! once it does, that crate supplies a second implementation that also
//! updates its BM25 index.

use async_trait::async_trait;
use thoth_db::{Chunk, ChunkRepository, Database};
use uuid::Uuid;

#[async_trait]
pub trait IndexPort: Send + Sync {
    async fn index_chunks(&self, paper_id: Uuid, chunks: Vec<Chunk>) -> thoth_db::Result<()>;
}

pub struct ChunkIndexer {
    chunks: ChunkRepository,
}

impl ChunkIndexer {
    pub fn new(db: std::sync::Arc<Database>) -> Self {
        Self { chunks: ChunkRepository::new(db) }
    }
}

#[async_trait]
impl IndexPort for ChunkIndexer {
    async fn index_chunks(&self, paper_id: Uuid, chunks: Vec<Chunk>) -> thoth_db::Result<()> {
        self.chunks.delete_by_paper_id(paper_id).await?;
        self.chunks.insert_batch(&chunks).await
    }
}
