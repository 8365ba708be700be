//! arXiv enhancement: title search for citations that look like preprints
//! (spec §4.2 step 5). Like the other enhancement sources, the gateway
//! treats the response as JSON per spec §6.2's interface contract.

use std::sync::Arc;

use async_trait::async_trait;
use thoth_common::Result;
use thoth_db::Citation;
use thoth_gateway::Gateway;

use super::CitationEnhancer;

const SERVICE: &str = "arxiv";

pub struct ArxivClient {
    gateway: Arc<Gateway>,
}

impl ArxivClient {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl CitationEnhancer for ArxivClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn enhance(&self, citation: &mut Citation) -> Result<bool> {
        if citation.arxiv_id.is_some() {
            return Ok(false);
        }
        let Some(title) = citation.title.clone() else {
            return Ok(false);
        };

        let search_query = format!("ti:\"{title}\"");
        let response = self.gateway.get(SERVICE, "/query", &[("search_query", search_query.as_str()), ("max_results", "1")]).await?;

        let Some(entry) = response["entries"].as_array().and_then(|a| a.first()) else {
            return Ok(false);
        };

        let Some(id) = entry["id"].as_str() else {
            return Ok(false);
        };
        citation.arxiv_id = Some(id.trim_start_matches("http://arxiv.org/abs/").to_string());
        if citation.pdf_url.is_none() {
            citation.pdf_url = entry["pdf_url"].as_str().map(String::from);
            citation.pdf_source = Some(SERVICE.to_string());
            citation.is_open_access = Some(true);
        }
        Ok(true)
    }
}
