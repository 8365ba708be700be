//! thoth-config — typed configuration surface for the rest of the
//! workspace: workspace directory layout, feature flags, and the
//! analysis-schema preset document (spec §6.3).
//!
//! Grounded on `src/thoth/config/simplified.py`'s `CoreConfig`/
//! `FeatureConfig` split, env-prefixed `THOTH_` overrides (here via
//! `dotenvy` + `std::env`, since there is no Pydantic-settings equivalent
//! in the corpus).

pub mod features;
pub mod paths;
pub mod schema;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use features::FeatureConfig;
pub use paths::WorkspacePaths;
pub use schema::AnalysisSchemaConfig;

const ENV_PREFIX: &str = "THOTH_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub semantic_scholar: Option<String>,
    pub unpaywall_email: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self { openai: None, anthropic: None, semantic_scholar: None, unpaywall_email: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThothConfig {
    pub paths: WorkspacePaths,
    pub api_keys: ApiKeys,
    pub features: FeatureConfig,
}

impl Default for ThothConfig {
    fn default() -> Self {
        Self { paths: WorkspacePaths::default(), api_keys: ApiKeys::default(), features: FeatureConfig::default() }
    }
}

impl ThothConfig {
    /// Loads `.env` (if present) then a TOML config file, applying
    /// `THOTH_`-prefixed environment overrides last. Never fails: a
    /// missing or malformed config file falls back to defaults, matching
    /// the "never crash" posture spec §6.3 mandates for the schema
    /// document and which this crate applies to the whole config surface.
    pub fn load(config_path: &Path) -> Self {
        let _ = dotenvy::dotenv();

        let mut cfg = match std::fs::read_to_string(config_path) {
            Ok(raw) => toml::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(path = %config_path.display(), error = %err, "invalid config file, falling back to defaults");
                ThothConfig::default()
            }),
            Err(_) => {
                tracing::warn!(path = %config_path.display(), "config file not found, using defaults");
                ThothConfig::default()
            }
        };

        cfg.apply_env_overrides();
        cfg
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var(format!("{ENV_PREFIX}OPENAI_API_KEY")) {
            self.api_keys.openai = Some(v);
        }
        if let Ok(v) = std::env::var(format!("{ENV_PREFIX}ANTHROPIC_API_KEY")) {
            self.api_keys.anthropic = Some(v);
        }
        if let Ok(v) = std::env::var(format!("{ENV_PREFIX}SEMANTIC_SCHOLAR_API_KEY")) {
            self.api_keys.semantic_scholar = Some(v);
        }
        if let Ok(v) = std::env::var(format!("{ENV_PREFIX}UNPAYWALL_EMAIL")) {
            self.api_keys.unpaywall_email = Some(v);
        }
        if let Ok(v) = std::env::var(format!("{ENV_PREFIX}WORKSPACE_DIR")) {
            self.paths = WorkspacePaths::rooted_at(&PathBuf::from(v));
        }
    }

    /// Loads the analysis-schema document from its configured path,
    /// falling back to the built-in default preset on any failure and
    /// logging a warning — never crashing (spec §6.3).
    pub fn load_schema(&self) -> AnalysisSchemaConfig {
        let schema_path = self.paths.knowledge_base_dir.join("analysis_schema.toml");
        match std::fs::read_to_string(&schema_path) {
            Ok(raw) => {
                let (schema, fell_back) = AnalysisSchemaConfig::load_or_default(&raw);
                if fell_back {
                    tracing::warn!(path = %schema_path.display(), "invalid analysis-schema document, using built-in default preset");
                }
                schema
            }
            Err(_) => {
                tracing::warn!(path = %schema_path.display(), "analysis-schema document not found, using built-in default preset");
                AnalysisSchemaConfig::default_preset_only()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let cfg = ThothConfig::load(Path::new("/nonexistent/thoth.toml"));
        assert_eq!(cfg.paths.workspace_dir, PathBuf::from("./workspace"));
    }

    #[test]
    fn malformed_config_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not valid toml {{{{{{").unwrap();
        let cfg = ThothConfig::load(file.path());
        assert_eq!(cfg.features.rag.top_k, 8);
    }

    #[test]
    fn valid_config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [paths]
            workspace_dir = "/tmp/custom-ws"

            [features]
            query_based_routing = false
            "#
        )
        .unwrap();
        let cfg = ThothConfig::load(file.path());
        assert_eq!(cfg.paths.workspace_dir, PathBuf::from("/tmp/custom-ws"));
        assert!(!cfg.features.query_based_routing);
    }

    #[test]
    fn missing_schema_document_falls_back_to_default_preset() {
        let cfg = ThothConfig { paths: WorkspacePaths::rooted_at(Path::new("/nonexistent-ws")), ..ThothConfig::default() };
        let schema = cfg.load_schema();
        assert_eq!(schema.active_preset, "default");
    }
}
