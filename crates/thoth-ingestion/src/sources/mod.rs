//! Citation-enhancement clients (spec §4.2 step 5, §4.5): each fills in
//! missing `Citation` fields (DOI, arXiv id, PDF location) from one
//! external source, going through the shared gateway. A single source's
//! failure never aborts enhancement — the citation is simply left with
//! its best-known fields (spec §4.2: "An individual external failure
//! never cascades").

pub mod arxiv;
pub mod opencitations;
pub mod pdf_locator;
pub mod scholarly;
pub mod semantic_scholar;

use async_trait::async_trait;
use thoth_db::Citation;

/// Common interface for all citation-enhancement clients. `enhance`
/// mutates `citation` in place and returns whether it changed anything,
/// so callers can decide whether to keep fanning out to further sources.
#[async_trait]
pub trait CitationEnhancer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn enhance(&self, citation: &mut Citation) -> thoth_common::Result<bool>;
}

/// A citation still needs enhancement if it is missing a DOI, an arXiv
/// id, and a PDF location — the fields the enhancement fan-out exists
/// to fill (spec §4.2 step 5: "only for citations still missing fields").
pub fn needs_enhancement(citation: &Citation) -> bool {
    citation.doi.is_none() && citation.arxiv_id.is_none() && citation.pdf_url.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn needs_enhancement_is_true_only_when_doi_arxiv_and_pdf_are_all_missing() {
        let mut citation = Citation::new(Uuid::new_v4(), "Smith, 2020".to_string());
        assert!(needs_enhancement(&citation));

        citation.doi = Some("10.1/x".to_string());
        assert!(!needs_enhancement(&citation));
    }

    #[test]
    fn needs_enhancement_is_false_once_arxiv_id_is_known() {
        let mut citation = Citation::new(Uuid::new_v4(), "Smith, 2020".to_string());
        citation.arxiv_id = Some("2010.00000".to_string());
        assert!(!needs_enhancement(&citation));
    }
}
