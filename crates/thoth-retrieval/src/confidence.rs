//! CRAG tri-level confidence assessment (spec §4.4 step 5): turns the
//! fraction of chunks graded relevant into a corrective-action decision.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalConfidence {
    /// Strong local coverage; answer directly from retrieved chunks.
    Correct,
    /// Partial coverage; refine retrieved knowledge before answering.
    Ambiguous,
    /// Weak coverage; local retrieval should be abandoned.
    Incorrect,
}

pub const DEFAULT_UPPER_THRESHOLD: f64 = 0.7;
pub const DEFAULT_LOWER_THRESHOLD: f64 = 0.4;

/// `confidence` is the fraction of candidate chunks graded relevant.
pub fn evaluate_retrieval_confidence(confidence: f64, upper_threshold: f64, lower_threshold: f64) -> RetrievalConfidence {
    if confidence >= upper_threshold {
        RetrievalConfidence::Correct
    } else if confidence >= lower_threshold {
        RetrievalConfidence::Ambiguous
    } else {
        RetrievalConfidence::Incorrect
    }
}
