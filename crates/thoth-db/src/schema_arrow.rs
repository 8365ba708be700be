//! Arrow schema and conversion utilities for LanceDB.
//!
//! This module provides the Arrow record batch conversion functions
//! needed to work with LanceDB's API.

use crate::error::{DbError, Result};
use crate::schema::*;
use arrow_array::{Array, BooleanArray, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

fn opt_string(col: &dyn Array, row: usize) -> Option<String> {
    let arr = col.as_any().downcast_ref::<StringArray>().unwrap();
    if arr.is_null(row) { None } else { Some(arr.value(row).to_string()) }
}

fn req_string(col: &dyn Array, row: usize) -> String {
    col.as_any().downcast_ref::<StringArray>().unwrap().value(row).to_string()
}

fn opt_i64(col: &dyn Array, row: usize) -> Option<i64> {
    let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
    if arr.is_null(row) { None } else { Some(arr.value(row)) }
}

fn opt_bool(col: &dyn Array, row: usize) -> Option<bool> {
    let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
    if arr.is_null(row) { None } else { Some(arr.value(row)) }
}

fn parse_rfc3339(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}

fn parse_uuid(s: &str) -> Result<uuid::Uuid> {
    uuid::Uuid::parse_str(s).map_err(|e| DbError::InvalidQuery(e.to_string()))
}

// =============================================================================
// Article Arrow Conversion
// =============================================================================

pub fn article_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("doi", DataType::Utf8, true),
        Field::new("arxiv_id", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, false),
        Field::new("authors", DataType::Utf8, false),
        Field::new("abstract_text", DataType::Utf8, true),
        Field::new("year", DataType::Int64, true),
        Field::new("pdf_path", DataType::Utf8, true),
        Field::new("markdown_path", DataType::Utf8, true),
        Field::new("note_path", DataType::Utf8, true),
        Field::new("tags", DataType::Utf8, false),
        Field::new("normalized_title", DataType::Utf8, false),
        Field::new("parse_status", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
        Field::new("updated_at", DataType::Utf8, false),
    ]))
}

pub fn article_to_record(article: &Article) -> Result<RecordBatch> {
    let schema = article_schema();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec![article.id.to_string()])) as Arc<dyn Array>,
            Arc::new(StringArray::from(vec![article.doi.as_deref()])),
            Arc::new(StringArray::from(vec![article.arxiv_id.as_deref()])),
            Arc::new(StringArray::from(vec![article.title.as_str()])),
            Arc::new(StringArray::from(vec![article.authors.as_str()])),
            Arc::new(StringArray::from(vec![article.abstract_text.as_deref()])),
            Arc::new(Int64Array::from(vec![article.year])),
            Arc::new(StringArray::from(vec![article.pdf_path.as_deref()])),
            Arc::new(StringArray::from(vec![article.markdown_path.as_deref()])),
            Arc::new(StringArray::from(vec![article.note_path.as_deref()])),
            Arc::new(StringArray::from(vec![article.tags.as_str()])),
            Arc::new(StringArray::from(vec![article.normalized_title.as_str()])),
            Arc::new(StringArray::from(vec![article.parse_status.as_str()])),
            Arc::new(StringArray::from(vec![article.created_at.to_rfc3339()])),
            Arc::new(StringArray::from(vec![article.updated_at.to_rfc3339()])),
        ],
    )
    .map_err(|e| DbError::Arrow(e.to_string()))
}

pub fn record_to_article(batch: &RecordBatch, row: usize) -> Result<Article> {
    Ok(Article {
        id: parse_uuid(&req_string(batch.column(0), row))?,
        doi: opt_string(batch.column(1), row),
        arxiv_id: opt_string(batch.column(2), row),
        title: req_string(batch.column(3), row),
        authors: req_string(batch.column(4), row),
        abstract_text: opt_string(batch.column(5), row),
        year: opt_i64(batch.column(6), row),
        pdf_path: opt_string(batch.column(7), row),
        markdown_path: opt_string(batch.column(8), row),
        note_path: opt_string(batch.column(9), row),
        tags: req_string(batch.column(10), row),
        normalized_title: req_string(batch.column(11), row),
        parse_status: req_string(batch.column(12), row),
        created_at: parse_rfc3339(&req_string(batch.column(13), row)),
        updated_at: parse_rfc3339(&req_string(batch.column(14), row)),
    })
}

// =============================================================================
// Citation Arrow Conversion
// =============================================================================

pub fn citation_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("source_article_id", DataType::Utf8, false),
        Field::new("target_article_id", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, true),
        Field::new("authors", DataType::Utf8, false),
        Field::new("year", DataType::Int64, true),
        Field::new("doi", DataType::Utf8, true),
        Field::new("arxiv_id", DataType::Utf8, true),
        Field::new("pdf_url", DataType::Utf8, true),
        Field::new("pdf_source", DataType::Utf8, true),
        Field::new("is_open_access", DataType::Boolean, true),
        Field::new("backup_id", DataType::Utf8, true),
        Field::new("raw", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

pub fn citation_to_record(citation: &Citation) -> Result<RecordBatch> {
    let schema = citation_schema();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec![citation.id.to_string()])) as Arc<dyn Array>,
            Arc::new(StringArray::from(vec![citation.source_article_id.to_string()])),
            Arc::new(StringArray::from(vec![citation.target_article_id.map(|id| id.to_string())])),
            Arc::new(StringArray::from(vec![citation.title.as_deref()])),
            Arc::new(StringArray::from(vec![citation.authors.as_str()])),
            Arc::new(Int64Array::from(vec![citation.year])),
            Arc::new(StringArray::from(vec![citation.doi.as_deref()])),
            Arc::new(StringArray::from(vec![citation.arxiv_id.as_deref()])),
            Arc::new(StringArray::from(vec![citation.pdf_url.as_deref()])),
            Arc::new(StringArray::from(vec![citation.pdf_source.as_deref()])),
            Arc::new(BooleanArray::from(vec![citation.is_open_access])),
            Arc::new(StringArray::from(vec![citation.backup_id.as_deref()])),
            Arc::new(StringArray::from(vec![citation.raw.as_str()])),
            Arc::new(StringArray::from(vec![citation.created_at.to_rfc3339()])),
        ],
    )
    .map_err(|e| DbError::Arrow(e.to_string()))
}

pub fn record_to_citation(batch: &RecordBatch, row: usize) -> Result<Citation> {
    Ok(Citation {
        id: parse_uuid(&req_string(batch.column(0), row))?,
        source_article_id: parse_uuid(&req_string(batch.column(1), row))?,
        target_article_id: opt_string(batch.column(2), row).map(|s| parse_uuid(&s)).transpose()?,
        title: opt_string(batch.column(3), row),
        authors: req_string(batch.column(4), row),
        year: opt_i64(batch.column(5), row),
        doi: opt_string(batch.column(6), row),
        arxiv_id: opt_string(batch.column(7), row),
        pdf_url: opt_string(batch.column(8), row),
        pdf_source: opt_string(batch.column(9), row),
        is_open_access: opt_bool(batch.column(10), row),
        backup_id: opt_string(batch.column(11), row),
        raw: req_string(batch.column(12), row),
        created_at: parse_rfc3339(&req_string(batch.column(13), row)),
    })
}

// =============================================================================
// Chunk Arrow Conversion
// =============================================================================

pub fn chunk_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("paper_id", DataType::Utf8, false),
        Field::new("chunk_index", DataType::Int64, false),
        Field::new("chunk_type", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
        Field::new("section", DataType::Utf8, true),
        Field::new("page", DataType::Int64, true),
        Field::new("enriched", DataType::Boolean, false),
        Field::new("context", DataType::Utf8, true),
        Field::new("created_at", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, false)), EMBEDDING_DIM as i32),
            true,
        ),
    ]))
}

pub fn chunk_to_record(chunk: &Chunk) -> Result<RecordBatch> {
    let schema = chunk_schema();

    let embedding: Arc<dyn Array> = if let Some(ref emb) = chunk.embedding {
        if emb.len() != EMBEDDING_DIM {
            return Err(DbError::InvalidEmbeddingDimension { expected: EMBEDDING_DIM, actual: emb.len() });
        }
        let values = Float32Array::from(emb.clone());
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        Arc::new(
            FixedSizeListArray::try_new(field, EMBEDDING_DIM as i32, Arc::new(values), None)
                .map_err(|e| DbError::Arrow(e.to_string()))?,
        )
    } else {
        Arc::new(FixedSizeListArray::new_null(Arc::new(Field::new("item", DataType::Float32, false)), EMBEDDING_DIM as i32, 1))
    };

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec![chunk.id.to_string()])) as Arc<dyn Array>,
            Arc::new(StringArray::from(vec![chunk.paper_id.to_string()])),
            Arc::new(Int64Array::from(vec![chunk.chunk_index])),
            Arc::new(StringArray::from(vec![chunk.chunk_type.as_str()])),
            Arc::new(StringArray::from(vec![chunk.content.as_str()])),
            Arc::new(StringArray::from(vec![chunk.metadata.as_str()])),
            Arc::new(StringArray::from(vec![chunk.section.as_deref()])),
            Arc::new(Int64Array::from(vec![chunk.page])),
            Arc::new(BooleanArray::from(vec![chunk.enriched])),
            Arc::new(StringArray::from(vec![chunk.context.as_deref()])),
            Arc::new(StringArray::from(vec![chunk.created_at.to_rfc3339()])),
            embedding,
        ],
    )
    .map_err(|e| DbError::Arrow(e.to_string()))
}

pub fn record_to_chunk(batch: &RecordBatch, row: usize) -> Result<Chunk> {
    let get_embedding = |col: &dyn Array| -> Option<Vec<f32>> {
        if col.is_null(row) {
            return None;
        }
        let list_arr = col.as_any().downcast_ref::<FixedSizeListArray>().unwrap();
        if list_arr.is_null(row) {
            return None;
        }
        let values = list_arr.value(row);
        let float_arr = values.as_any().downcast_ref::<Float32Array>().unwrap();
        Some(float_arr.values().to_vec())
    };

    Ok(Chunk {
        id: parse_uuid(&req_string(batch.column(0), row))?,
        paper_id: parse_uuid(&req_string(batch.column(1), row))?,
        chunk_index: batch.column(2).as_any().downcast_ref::<Int64Array>().unwrap().value(row),
        chunk_type: req_string(batch.column(3), row),
        content: req_string(batch.column(4), row),
        metadata: req_string(batch.column(5), row),
        section: opt_string(batch.column(6), row),
        page: opt_i64(batch.column(7), row),
        enriched: batch.column(8).as_any().downcast_ref::<BooleanArray>().unwrap().value(row),
        context: opt_string(batch.column(9), row),
        created_at: parse_rfc3339(&req_string(batch.column(10), row)),
        embedding: get_embedding(batch.column(11)),
    })
}
