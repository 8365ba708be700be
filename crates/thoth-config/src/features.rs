//! Feature flags, pruned from the original `FeatureConfig` down to the
//! toggles this workspace actually has a component for (no `api_server`,
//! `monitor`, or `research_agent` — those crates were trimmed, see
//! DESIGN.md).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmRoleConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for LlmRoleConfig {
    fn default() -> Self {
        Self { model: "gpt-4o-mini".to_string(), temperature: 0.2, max_output_tokens: 2048 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagFeature {
    pub enabled: bool,
    pub top_k: usize,
    pub rrf_k: u32,
    pub strict_hallucination_mode: bool,
    /// CRAG confidence at or above this is treated as correct.
    pub confidence_upper_threshold: f64,
    /// CRAG confidence below this is treated as incorrect; between the
    /// two thresholds is ambiguous.
    pub confidence_lower_threshold: f64,
}

impl Default for RagFeature {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: 8,
            rrf_k: 60,
            strict_hallucination_mode: false,
            confidence_upper_threshold: 0.7,
            confidence_lower_threshold: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryFeature {
    pub enabled: bool,
    pub poll_interval_secs: u64,
}

impl Default for DiscoveryFeature {
    fn default() -> Self {
        Self { enabled: false, poll_interval_secs: 3600 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub query_based_routing: bool,
    pub scrape_filter_llm: LlmRoleConfig,
    pub analysis_llm: LlmRoleConfig,
    pub citation_extraction_llm: LlmRoleConfig,
    pub rag: RagFeature,
    pub discovery: DiscoveryFeature,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            query_based_routing: true,
            scrape_filter_llm: LlmRoleConfig::default(),
            analysis_llm: LlmRoleConfig::default(),
            citation_extraction_llm: LlmRoleConfig::default(),
            rag: RagFeature::default(),
            discovery: DiscoveryFeature::default(),
        }
    }
}
