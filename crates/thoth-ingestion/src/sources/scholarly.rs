//! Scholarly (Google Scholar) enhancement — spec §6.2 lists "an optional
//! Google Scholar scraper" among the system's outbound HTTP surface.
//! Google Scholar has no JSON API; every other client in this module
//! relies on the gateway's JSON response contract (spec §6.2: "HTTP JSON
//! to: ..."). Rather than give this one source a second, ungoverned HTTP
//! path that bypasses the gateway's rate limiting and circuit breaking,
//! this client is a documented no-op until the gateway grows a raw-text
//! response mode. It still satisfies the fan-out order in spec §4.2 step
//! 5 — it is simply never the source that fills a field.

use async_trait::async_trait;
use thoth_common::Result;
use thoth_db::Citation;

use super::CitationEnhancer;

pub struct ScholarlyClient;

impl ScholarlyClient {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScholarlyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CitationEnhancer for ScholarlyClient {
    fn name(&self) -> &'static str {
        "scholarly"
    }

    async fn enhance(&self, _citation: &mut Citation) -> Result<bool> {
        Ok(false)
    }
}
