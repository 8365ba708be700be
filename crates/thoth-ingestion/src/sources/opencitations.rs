//! OpenCitations enhancement: resolves a DOI's bibliographic metadata.
//! Runs after Semantic Scholar and only for citations still missing
//! fields (spec §4.2 step 5), so this client requires a DOI the earlier
//! step already found — it cannot discover one on its own.

use std::sync::Arc;

use async_trait::async_trait;
use thoth_common::Result;
use thoth_db::Citation;
use thoth_gateway::Gateway;

use super::CitationEnhancer;

const SERVICE: &str = "opencitations";

pub struct OpenCitationsClient {
    gateway: Arc<Gateway>,
}

impl OpenCitationsClient {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl CitationEnhancer for OpenCitationsClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn enhance(&self, citation: &mut Citation) -> Result<bool> {
        let Some(doi) = citation.doi.clone() else {
            return Ok(false);
        };

        let response = self.gateway.get(SERVICE, &format!("/metadata/{doi}"), &[]).await?;
        let Some(entry) = response.as_array().and_then(|a| a.first()) else {
            return Ok(false);
        };

        let mut changed = false;
        if citation.year.is_none() {
            if let Some(year) = entry["year"].as_str().and_then(|y| y.parse::<i64>().ok()) {
                citation.year = Some(year);
                changed = true;
            }
        }
        if citation.authors == "[]" {
            if let Some(author_str) = entry["author"].as_str() {
                let names: Vec<String> = author_str.split(';').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
                if !names.is_empty() {
                    citation.authors = serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string());
                    changed = true;
                }
            }
        }

        Ok(changed)
    }
}
