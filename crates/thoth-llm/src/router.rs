//! LLM router — a named backend registry with per-role defaults. The
//! teacher's router selected a backend by data-classification policy;
//! this workspace has no such policy, so routing is by role instead:
//! callers (the analysis step, the citation-extraction step, the
//! query-driven filter's evaluator, the retrieval pipeline's grader and
//! answerer) each ask for "their" backend by role name, and the role
//! layout is wired up once at startup from `thoth_config::FeatureConfig`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::{LlmBackend, LlmError, LlmRequest, LlmResponse};

pub struct LlmRouter {
    backends: HashMap<String, Arc<dyn LlmBackend>>,
    roles: HashMap<String, String>,
    embed_role: String,
}

impl LlmRouter {
    pub fn new() -> Self {
        Self { backends: HashMap::new(), roles: HashMap::new(), embed_role: "embed".to_string() }
    }

    pub fn register_backend(&mut self, name: impl Into<String>, backend: Arc<dyn LlmBackend>) {
        self.backends.insert(name.into(), backend);
    }

    /// Assigns a role (e.g. "analysis", "citation_extraction",
    /// "scrape_filter", "query_routing", "grading", "answer",
    /// "hallucination_check") to a registered backend name.
    pub fn set_role(&mut self, role: impl Into<String>, backend_name: impl Into<String>) {
        self.roles.insert(role.into(), backend_name.into());
    }

    pub fn set_embed_role(&mut self, backend_name: impl Into<String>) {
        self.embed_role = backend_name.into();
    }

    pub async fn complete_for_role(&self, role: &str, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let backend = self.backend_for_role(role)?;

        tracing::info!(role, model = backend.model_id(), is_local = backend.is_local(), "LLM request routed");

        backend.complete(req).await
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let backend = self
            .backends
            .get(&self.embed_role)
            .ok_or_else(|| LlmError::Unavailable(format!("embedding backend '{}' not registered", self.embed_role)))?;
        backend.embed(texts).await
    }

    pub fn backend_for_role(&self, role: &str) -> Result<&Arc<dyn LlmBackend>, LlmError> {
        let backend_name = self.roles.get(role).ok_or_else(|| LlmError::Unavailable(format!("no backend assigned to role '{role}'")))?;
        self.backends
            .get(backend_name)
            .ok_or_else(|| LlmError::Unavailable(format!("backend '{backend_name}' assigned to role '{role}' is not registered")))
    }

    pub fn registered_backends(&self) -> Vec<(&str, bool)> {
        self.backends.iter().map(|(name, b)| (name.as_str(), b.is_local())).collect()
    }
}

impl Default for LlmRouter {
    fn default() -> Self {
        Self::new()
    }
}
