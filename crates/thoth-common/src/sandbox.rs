use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::ThothError;

/// A sandbox-capped HTTP client that only allows requests to approved
/// domains. The gateway (`thoth-gateway`) builds one of these per service
/// so that rate limiting, caching, and retry always sit behind an
/// allowlist check — no caller can reach an un-configured host.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a new SandboxClient with the default allowlist of domains
    /// consumed by the core (spec §6.2).
    pub fn new() -> Result<Self, ThothError> {
        let mut allowlist = HashSet::new();
        let domains = [
            "eutils.ncbi.nlm.nih.gov", // PubMed
            "www.ebi.ac.uk",           // Europe PMC
            "api.biorxiv.org",         // bioRxiv
            "export.arxiv.org",        // arXiv
            "api.crossref.org",        // Crossref
            "api.semanticscholar.org", // Semantic Scholar
            "opencitations.net",       // OpenCitations
            "api.unpaywall.org",       // Unpaywall
            "api.openalex.org",        // OpenAlex
            "scholar.google.com",      // Google Scholar (optional scraper)
            "localhost",               // local LLM / embedding backend
            "127.0.0.1",
            "api.openai.com",          // LLM gateway
            "api.anthropic.com",       // LLM gateway
        ];
        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ThothError::ConfigInvalid(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                return self
                    .allowlist
                    .iter()
                    .any(|allowed| host == allowed || host.ends_with(&format!(".{allowed}")));
            }
        }
        false
    }

    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, ThothError> {
        self.checked(url).map(|_| self.client.get(url))
    }

    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, ThothError> {
        self.checked(url).map(|_| self.client.post(url))
    }

    pub fn request(&self, method: reqwest::Method, url: &str) -> Result<reqwest::RequestBuilder, ThothError> {
        self.checked(url).map(|_| self.client.request(method, url))
    }

    fn checked(&self, url: &str) -> Result<(), ThothError> {
        if !self.is_allowed(url) {
            return Err(ThothError::InputInvalid(format!(
                "domain not in allowlist for URL {url}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_configured_domain_and_subdomains() {
        let client = SandboxClient::new().unwrap();
        assert!(client.is_allowed("https://api.crossref.org/works/10.1/x"));
        assert!(client.is_allowed("https://sub.api.openai.com/v1"));
    }

    #[test]
    fn rejects_unlisted_domain() {
        let client = SandboxClient::new().unwrap();
        assert!(!client.is_allowed("https://evil.example.com/steal"));
    }
}
