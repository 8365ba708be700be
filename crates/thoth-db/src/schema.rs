//! Schema definitions for LanceDB tables.
//!
//! LanceDB uses Apache Arrow for storage, so we define schemas
//! using Arrow types with vector support for embeddings.
//!
//! Tables: articles, citations, chunks — the three entities the citation
//! graph and retrieval engine own (spec §3.2). Array-valued fields
//! (`authors`, `tags`) are stored JSON-encoded in a Utf8 column; LanceDB
//! has no native list-of-string column that round-trips through
//! `merge_insert` as cleanly.

/// Embedding dimension. Matches the default `thoth-llm` embedding backend;
/// callers that plug in a different embedding model must use a database
/// built with a matching dimension.
pub const EMBEDDING_DIM: usize = 768;

// =============================================================================
// Article Schema
// =============================================================================

/// Article record stored in LanceDB. See spec §3.1.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Article {
    pub id: uuid::Uuid,
    pub doi: Option<String>,
    pub arxiv_id: Option<String>,
    pub title: String,
    /// JSON array of author names.
    pub authors: String,
    pub abstract_text: Option<String>,
    pub year: Option<i64>,
    pub pdf_path: Option<String>,
    pub markdown_path: Option<String>,
    pub note_path: Option<String>,
    /// JSON array of tag strings.
    pub tags: String,
    pub normalized_title: String,
    pub parse_status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Article {
    pub fn new(title: String) -> Self {
        let now = chrono::Utc::now();
        let normalized_title = thoth_common::ids::normalize_title(&title);
        Self {
            id: uuid::Uuid::new_v4(),
            doi: None,
            arxiv_id: None,
            title,
            authors: "[]".to_string(),
            abstract_text: None,
            year: None,
            pdf_path: None,
            markdown_path: None,
            note_path: None,
            tags: "[]".to_string(),
            normalized_title,
            parse_status: "pending".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Citation Schema
// =============================================================================

/// Citation record stored in LanceDB. See spec §3.1.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Citation {
    pub id: uuid::Uuid,
    pub source_article_id: uuid::Uuid,
    pub target_article_id: Option<uuid::Uuid>,
    pub title: Option<String>,
    /// JSON array of author names.
    pub authors: String,
    pub year: Option<i64>,
    pub doi: Option<String>,
    pub arxiv_id: Option<String>,
    pub pdf_url: Option<String>,
    pub pdf_source: Option<String>,
    pub is_open_access: Option<bool>,
    pub backup_id: Option<String>,
    /// Raw citation text as extracted, kept for audit/debugging.
    pub raw: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Citation {
    pub fn new(source_article_id: uuid::Uuid, raw: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            source_article_id,
            target_article_id: None,
            title: None,
            authors: "[]".to_string(),
            year: None,
            doi: None,
            arxiv_id: None,
            pdf_url: None,
            pdf_source: None,
            is_open_access: None,
            backup_id: None,
            raw,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.target_article_id.is_some()
    }
}

// =============================================================================
// Chunk Schema
// =============================================================================

/// Document chunk with optional embedding. See spec §3.1.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Chunk {
    pub id: uuid::Uuid,
    pub paper_id: uuid::Uuid,
    pub chunk_index: i64,
    pub chunk_type: String,
    pub content: String,
    /// JSON-encoded metadata map.
    pub metadata: String,
    pub section: Option<String>,
    pub page: Option<i64>,
    pub enriched: bool,
    pub context: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    pub fn new(paper_id: uuid::Uuid, chunk_index: i64, chunk_type: String, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            paper_id,
            chunk_index,
            chunk_type,
            content,
            metadata: "{}".to_string(),
            section: None,
            page: None,
            enriched: false,
            context: None,
            created_at: chrono::Utc::now(),
            embedding: None,
        }
    }
}

// =============================================================================
// Table Names
// =============================================================================

pub const TABLE_ARTICLES: &str = "articles";
pub const TABLE_CITATIONS: &str = "citations";
pub const TABLE_CHUNKS: &str = "chunks";
