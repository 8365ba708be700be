//! Semantic Scholar enhancement (spec §4.2 step 5: called in batch
//! first, before the other sources). Semantic Scholar's batch endpoint
//! accepts a list of free-text titles and returns best-effort matches in
//! the same order, which keeps the batch call to one gateway round trip
//! regardless of how many citations a paper has.

use std::sync::Arc;

use async_trait::async_trait;
use thoth_common::Result;
use thoth_db::Citation;
use thoth_gateway::Gateway;

use super::CitationEnhancer;

const SERVICE: &str = "semantic_scholar";
const FIELDS: &str = "title,externalIds,year,authors,openAccessPdf";

pub struct SemanticScholarClient {
    gateway: Arc<Gateway>,
}

impl SemanticScholarClient {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Looks up every citation's title in one batched request and fills
    /// in whatever fields come back. Citations with no title are
    /// skipped; unmatched citations are left untouched.
    pub async fn enhance_batch(&self, citations: &mut [Citation]) -> Result<()> {
        let queries: Vec<&str> = citations.iter().map(|c| c.title.as_deref().unwrap_or("")).collect();
        if queries.iter().all(|q| q.is_empty()) {
            return Ok(());
        }

        let body = serde_json::json!({ "titles": queries });
        let response = self.gateway.post(SERVICE, &format!("/paper/search/batch?fields={FIELDS}"), Some(body)).await?;

        let Some(matches) = response["matches"].as_array() else {
            return Ok(());
        };

        for (citation, matched) in citations.iter_mut().zip(matches.iter()) {
            if matched.is_null() {
                continue;
            }
            apply_match(citation, matched);
        }

        Ok(())
    }
}

#[async_trait]
impl CitationEnhancer for SemanticScholarClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn enhance(&self, citation: &mut Citation) -> Result<bool> {
        let Some(title) = citation.title.clone() else {
            return Ok(false);
        };
        let response = self
            .gateway
            .get(SERVICE, "/paper/search/match", &[("query", title.as_str()), ("fields", FIELDS)])
            .await?;
        if response["data"].is_null() {
            return Ok(false);
        }
        apply_match(citation, &response["data"]);
        Ok(true)
    }
}

fn apply_match(citation: &mut Citation, matched: &serde_json::Value) {
    if citation.doi.is_none() {
        citation.doi = matched["externalIds"]["DOI"].as_str().map(String::from);
    }
    if citation.arxiv_id.is_none() {
        citation.arxiv_id = matched["externalIds"]["ArXiv"].as_str().map(String::from);
    }
    if citation.year.is_none() {
        citation.year = matched["year"].as_i64();
    }
    if citation.pdf_url.is_none() {
        if let Some(url) = matched["openAccessPdf"]["url"].as_str() {
            citation.pdf_url = Some(url.to_string());
            citation.pdf_source = Some(SERVICE.to_string());
            citation.is_open_access = Some(true);
        }
    }
}
