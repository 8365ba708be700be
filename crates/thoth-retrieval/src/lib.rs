//! thoth-retrieval — the hybrid RAG retrieval engine (spec §4.4): dense
//! vector search fused with BM25 full-text search, CRAG-style confidence
//! grading and knowledge refinement, and a grounded-answer generation
//! and verification pipeline.

pub mod answer;
pub mod classify;
pub mod confidence;
pub mod context_enrichment;
pub mod decompose;
pub mod error;
pub mod fulltext;
pub mod fusion;
pub mod grading;
pub mod hallucination;
pub mod indexer;
pub mod pipeline;
pub mod refinement;

pub use answer::GeneratedAnswer;
pub use classify::QueryType;
pub use confidence::RetrievalConfidence;
pub use error::{Result, RetrievalError};
pub use fulltext::FullTextIndex;
pub use indexer::RetrievalIndexer;
pub use pipeline::{RetrievalPipeline, RetrievalResult};
