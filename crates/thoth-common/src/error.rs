//! Shared error taxonomy. See spec §7 — kinds here map 1:1 onto the
//! abstract error table; propagation (fail-fast vs. soft-degrade vs.
//! swallow) is a property of where a variant is matched, not of the type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThothError {
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error("fingerprint collision for {path}: {detail}")]
    FingerprintCollision { path: String, detail: String },

    #[error("OCR/conversion failed: {0}")]
    OcrFailed(String),

    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("citation extraction failed: {0}")]
    CitationExtractionFailed(String),

    #[error("external enhancement failed for {source}: {detail}")]
    ExternalEnhancementFailed { source: String, detail: String },

    #[error("rate limited by {service}, retry after {retry_after_secs:?}s")]
    GatewayRateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    #[error("circuit open for {service}")]
    GatewayCircuitOpen { service: String },

    #[error("index write failed: {0}")]
    IndexWriteFailed(String),

    #[error("retrieval grader failed: {0}")]
    RetrievalGraderFailed(String),

    #[error("hallucination detected: {0}")]
    HallucinationDetected(String),

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ThothError>;
