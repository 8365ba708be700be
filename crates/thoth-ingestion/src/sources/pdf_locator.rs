//! PDF-locator enhancement: resolves an open-access PDF URL for a DOI
//! via Unpaywall (spec §4.2 step 5, last in the fan-out order).

use std::sync::Arc;

use async_trait::async_trait;
use thoth_common::Result;
use thoth_db::Citation;
use thoth_gateway::Gateway;

use super::CitationEnhancer;

const SERVICE: &str = "unpaywall";

pub struct PdfLocatorClient {
    gateway: Arc<Gateway>,
    contact_email: String,
}

impl PdfLocatorClient {
    /// Unpaywall requires a contact email on every request.
    pub fn new(gateway: Arc<Gateway>, contact_email: String) -> Self {
        Self { gateway, contact_email }
    }
}

#[async_trait]
impl CitationEnhancer for PdfLocatorClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn enhance(&self, citation: &mut Citation) -> Result<bool> {
        if citation.pdf_url.is_some() {
            return Ok(false);
        }
        let Some(doi) = citation.doi.clone() else {
            return Ok(false);
        };

        let response = self.gateway.get(SERVICE, &format!("/{doi}"), &[("email", self.contact_email.as_str())]).await?;

        let Some(url) = response["best_oa_location"]["url_for_pdf"].as_str() else {
            return Ok(false);
        };

        citation.pdf_url = Some(url.to_string());
        citation.pdf_source = Some(SERVICE.to_string());
        citation.is_open_access = Some(true);
        Ok(true)
    }
}
