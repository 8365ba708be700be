//! thoth-ingestion — the PDF ingestion pipeline (spec §4.2): turns one
//! PDF into markdown, a structured analysis, a resolved citation list,
//! and a note, then hands the chunked markdown to the retrieval engine.

pub mod analysis;
pub mod chunker;
pub mod citation_extraction;
pub mod error;
pub mod models;
pub mod notes;
pub mod pdf_parser;
pub mod pipeline;
pub mod repository;
pub mod sources;

pub use error::{IngestionError, Result};
pub use pipeline::{IngestOutcome, Pipeline, PipelineConfig};
