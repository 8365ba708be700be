//! Section and chunk types shared by the PDF parser and chunker (spec
//! §4.2 steps 2 and 7, §3.1 Chunk).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Section types inferred from heading text during PDF parsing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SectionType {
    Abstract,
    Introduction,
    Methods,
    Results,
    Discussion,
    Conclusion,
    References,
    Table,
    FigureCaption,
    Other,
}

impl SectionType {
    /// Infers a section type from a heading string.
    pub fn from_heading(heading: &str) -> Self {
        let h = heading.to_lowercase();
        if h.contains("abstract") {
            SectionType::Abstract
        } else if h.contains("introduction") || h.starts_with("background") {
            SectionType::Introduction
        } else if h.contains("method") || h.contains("material") {
            SectionType::Methods
        } else if h.contains("result") {
            SectionType::Results
        } else if h.contains("discussion") {
            SectionType::Discussion
        } else if h.contains("conclusion") {
            SectionType::Conclusion
        } else if h.contains("reference") || h.contains("bibliography") {
            SectionType::References
        } else {
            SectionType::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Abstract => "abstract",
            SectionType::Introduction => "introduction",
            SectionType::Methods => "methods",
            SectionType::Results => "results",
            SectionType::Discussion => "discussion",
            SectionType::Conclusion => "conclusion",
            SectionType::References => "references",
            SectionType::Table => "table",
            SectionType::FigureCaption => "figure_caption",
            SectionType::Other => "other",
        }
    }
}

/// A parsed document chunk ready for embedding (spec §3.1 Chunk, before
/// it is handed to `thoth_db::Chunk::new`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub paper_id: Uuid,
    pub chunk_index: usize,
    pub section_type: SectionType,
    pub section_heading: Option<String>,
    pub content: String,
    pub page_number: Option<u32>,
    pub token_count: usize,
}
