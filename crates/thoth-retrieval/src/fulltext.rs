//! Lexical half of hybrid retrieval (spec §4.4): a tantivy index over
//! the same chunk rows the dense vector index holds, giving BM25-ranked
//! keyword search to fuse against ANN results.

use std::path::Path;

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Schema, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use uuid::Uuid;

use crate::error::Result;

/// One lexically-searchable hit: the chunk id plus its BM25 score.
#[derive(Debug, Clone)]
pub struct LexicalHit {
    pub chunk_id: Uuid,
    pub score: f32,
}

/// Writer buffer size; tantivy wants this in bytes and a small index
/// doesn't need much headroom.
const WRITER_HEAP_BYTES: usize = 50_000_000;

pub struct FullTextIndex {
    index: Index,
    reader: IndexReader,
    chunk_id_field: tantivy::schema::Field,
    content_field: tantivy::schema::Field,
}

impl FullTextIndex {
    /// Opens (or creates) a tantivy index rooted at `path`.
    pub fn open_or_create(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut schema_builder = Schema::builder();
        let chunk_id_field = schema_builder.add_text_field("chunk_id", STRING | STORED);
        let content_field = schema_builder.add_text_field("content", TEXT);
        let schema = schema_builder.build();

        let dir = tantivy::directory::MmapDirectory::open(path)?;
        let index = Index::open_or_create(dir, schema)?;
        let reader = index.reader_builder().reload_policy(ReloadPolicy::OnCommitWithDelay).try_into()?;

        Ok(Self { index, reader, chunk_id_field, content_field })
    }

    /// Adds or replaces a chunk's lexical entry. Replacement is
    /// delete-then-add within one writer session, same pattern as
    /// `thoth-db`'s `ChunkRepository::update_embedding`.
    pub fn upsert_chunks(&self, chunks: &[(Uuid, String)]) -> Result<()> {
        let mut writer: IndexWriter = self.index.writer(WRITER_HEAP_BYTES)?;
        for (chunk_id, content) in chunks {
            writer.delete_term(Term::from_field_text(self.chunk_id_field, &chunk_id.to_string()));
            writer.add_document(doc!(
                self.chunk_id_field => chunk_id.to_string(),
                self.content_field => content.as_str(),
            ))?;
        }
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    pub fn delete_by_chunk_ids(&self, chunk_ids: &[Uuid]) -> Result<()> {
        let mut writer: IndexWriter = self.index.writer(WRITER_HEAP_BYTES)?;
        for chunk_id in chunk_ids {
            writer.delete_term(Term::from_field_text(self.chunk_id_field, &chunk_id.to_string()));
        }
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// BM25 search (tantivy's default scorer) over chunk content, top `k`.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<LexicalHit>> {
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.content_field]);
        let parsed = parser.parse_query(query)?;

        let top_docs = searcher.search(&parsed, &TopDocs::with_limit(k))?;
        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let retrieved: TantivyDocument = searcher.doc(address)?;
            if let Some(value) = retrieved.get_first(self.chunk_id_field) {
                if let Some(text) = value.as_str() {
                    if let Ok(chunk_id) = Uuid::parse_str(text) {
                        hits.push(LexicalHit { chunk_id, score });
                    }
                }
            }
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_chunk_is_found_by_keyword() {
        let dir = tempfile::tempdir().unwrap();
        let index = FullTextIndex::open_or_create(dir.path()).unwrap();
        let id = Uuid::new_v4();
        index.upsert_chunks(&[(id, "transformer attention mechanisms for genomics".to_string())]).unwrap();

        let hits = index.search("transformer", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_id, id);
    }

    #[test]
    fn deleted_chunk_no_longer_matches() {
        let dir = tempfile::tempdir().unwrap();
        let index = FullTextIndex::open_or_create(dir.path()).unwrap();
        let id = Uuid::new_v4();
        index.upsert_chunks(&[(id, "quantum computing basics".to_string())]).unwrap();
        index.delete_by_chunk_ids(&[id]).unwrap();

        let hits = index.search("quantum", 10).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn upsert_replaces_rather_than_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let index = FullTextIndex::open_or_create(dir.path()).unwrap();
        let id = Uuid::new_v4();
        index.upsert_chunks(&[(id, "first version of the content".to_string())]).unwrap();
        index.upsert_chunks(&[(id, "second version mentions genomics".to_string())]).unwrap();

        assert!(index.search("first", 10).unwrap().is_empty());
        assert_eq!(index.search("genomics", 10).unwrap().len(), 1);
    }
}
