//! Analysis-schema configuration document (spec §6.3): which preset is
//! active, and what fields each preset extracts. Validated at load time;
//! an invalid document never aborts startup, it falls back to
//! [`AnalysisSchemaConfig::default_preset_only`] and the caller logs a
//! warning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Array,
    Object,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    /// Element type for `Array` fields; ignored otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<FieldType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaPreset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fields: BTreeMap<String, FieldSpec>,
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSchemaConfig {
    pub active_preset: String,
    pub presets: BTreeMap<String, SchemaPreset>,
    pub version: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaConfigError {
    #[error("active_preset '{0}' is not defined in presets")]
    MissingActivePreset(String),
    #[error("preset '{preset}' field '{field}' has no recognized type")]
    UnrecognizedFieldType { preset: String, field: String },
}

impl AnalysisSchemaConfig {
    /// Validates the invariants from spec §6.3: `active_preset` must name
    /// a defined preset, and every field must declare a recognized type
    /// (enforced structurally by `FieldType` already, but `items` on
    /// non-array fields is flagged here as a secondary check).
    pub fn validate(&self) -> Result<(), SchemaConfigError> {
        let active = self
            .presets
            .get(&self.active_preset)
            .ok_or_else(|| SchemaConfigError::MissingActivePreset(self.active_preset.clone()))?;

        for (field_name, spec) in &active.fields {
            if spec.field_type != FieldType::Array && spec.items.is_some() {
                return Err(SchemaConfigError::UnrecognizedFieldType {
                    preset: active.name.clone(),
                    field: field_name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn active(&self) -> Option<&SchemaPreset> {
        self.presets.get(&self.active_preset)
    }

    /// Built-in fallback used when the configured document fails
    /// validation or fails to parse. Never empty, never requires an
    /// external file.
    pub fn default_preset_only() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            "title".to_string(),
            FieldSpec { field_type: FieldType::String, required: true, description: "paper title".into(), items: None },
        );
        fields.insert(
            "authors".to_string(),
            FieldSpec { field_type: FieldType::Array, required: true, description: "author names".into(), items: Some(FieldType::String) },
        );
        fields.insert(
            "summary".to_string(),
            FieldSpec { field_type: FieldType::String, required: true, description: "one-paragraph summary".into(), items: None },
        );
        fields.insert(
            "methodology".to_string(),
            FieldSpec { field_type: FieldType::String, required: false, description: "methodology description".into(), items: None },
        );
        fields.insert(
            "key_points".to_string(),
            FieldSpec { field_type: FieldType::Array, required: false, description: "key findings".into(), items: Some(FieldType::String) },
        );
        fields.insert(
            "tags".to_string(),
            FieldSpec { field_type: FieldType::Array, required: false, description: "topical tags".into(), items: Some(FieldType::String) },
        );

        let preset = SchemaPreset {
            name: "default".to_string(),
            description: "Built-in fallback preset covering the core AnalysisRecord fields.".to_string(),
            fields,
            instructions: "Extract title, authors, a concise summary, methodology, key points and tags.".to_string(),
        };

        let mut presets = BTreeMap::new();
        presets.insert("default".to_string(), preset);

        Self { active_preset: "default".to_string(), presets, version: "1".to_string() }
    }

    /// Parses and validates a document, falling back to the built-in
    /// default on any failure. Returns the config plus whether a fallback
    /// occurred, so the caller can log a warning without this module
    /// depending on a logging backend.
    pub fn load_or_default(raw: &str) -> (Self, bool) {
        match toml::from_str::<Self>(raw).map_err(anyhow::Error::from).and_then(|cfg| {
            cfg.validate().map_err(anyhow::Error::from)?;
            Ok(cfg)
        }) {
            Ok(cfg) => (cfg, false),
            Err(_) => (Self::default_preset_only(), true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_validates() {
        assert!(AnalysisSchemaConfig::default_preset_only().validate().is_ok());
    }

    #[test]
    fn missing_active_preset_is_rejected() {
        let cfg = AnalysisSchemaConfig {
            active_preset: "nonexistent".to_string(),
            presets: BTreeMap::new(),
            version: "1".to_string(),
        };
        assert!(matches!(cfg.validate(), Err(SchemaConfigError::MissingActivePreset(_))));
    }

    #[test]
    fn malformed_document_falls_back_to_default() {
        let (cfg, fell_back) = AnalysisSchemaConfig::load_or_default("not valid toml {{{");
        assert!(fell_back);
        assert_eq!(cfg.active_preset, "default");
    }

    #[test]
    fn valid_document_with_unknown_active_preset_falls_back() {
        let raw = r#"
            active_preset = "missing"
            version = "1"
        "#;
        let (cfg, fell_back) = AnalysisSchemaConfig::load_or_default(raw);
        assert!(fell_back);
        assert_eq!(cfg.active_preset, "default");
    }
}
