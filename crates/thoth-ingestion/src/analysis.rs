//! Analysis step (spec §4.2 step 3, §3.1 AnalysisRecord): an LLM call
//! that returns a structured record conforming to the active schema
//! preset. The preset is polymorphic — its field set and instructions
//! are injected at request time rather than hard-coded into a Rust
//! struct, so the record is carried as a JSON object alongside the
//! preset name and schema version that produced it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thoth_config::schema::{FieldType, SchemaPreset};
use thoth_llm::{complete_structured, LlmBackend, LlmError, LlmRequest, Message};

/// A structured extraction keyed by the preset that produced it. Held as
/// a JSON map rather than a fixed struct so a new preset's fields don't
/// require a code change (spec §3.1: "the set of required fields is
/// determined at read time by the preset definition, not hard-coded").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub preset: String,
    pub schema_version: String,
    pub fields: BTreeMap<String, Value>,
}

/// Runs the analysis LLM call for `markdown` against `preset`, repairing
/// once on invalid output (via `complete_structured`) before the caller
/// treats the step as failed.
pub async fn analyze_document(
    backend: &dyn LlmBackend,
    preset: &SchemaPreset,
    schema_version: &str,
    markdown: &str,
    custom_instructions: Option<&str>,
) -> Result<AnalysisRecord, LlmError> {
    let system_prompt = build_system_prompt(preset, custom_instructions);
    let request = LlmRequest::new(vec![Message::system(system_prompt), Message::user(markdown.to_string())]);

    let preset_name = preset.name.clone();
    let required: Vec<String> = preset.fields.iter().filter(|(_, spec)| spec.required).map(|(name, _)| name.clone()).collect();

    let fields: BTreeMap<String, Value> = complete_structured(backend, request, move |fields: &BTreeMap<String, Value>| {
        for field in &required {
            if !fields.contains_key(field) {
                return Err(format!("missing required field '{field}'"));
            }
        }
        Ok(())
    })
    .await?;

    Ok(AnalysisRecord { preset: preset_name, schema_version: schema_version.to_string(), fields })
}

fn build_system_prompt(preset: &SchemaPreset, custom_instructions: Option<&str>) -> String {
    let mut prompt = String::from(
        "Extract structured information from the following academic paper markdown. \
         Return ONLY a single JSON object with exactly these fields:\n",
    );
    for (name, spec) in &preset.fields {
        let type_desc = match (spec.field_type, spec.items) {
            (FieldType::Array, Some(item)) => format!("array of {item:?}"),
            (ty, _) => format!("{ty:?}"),
        };
        prompt.push_str(&format!("- \"{name}\" ({type_desc}{}): {}\n", if spec.required { ", required" } else { "" }, spec.description));
    }
    if !preset.instructions.is_empty() {
        prompt.push_str(&format!("\n{}\n", preset.instructions));
    }
    if let Some(custom) = custom_instructions {
        prompt.push_str(&format!("\nAdditional instructions:\n{custom}\n"));
    }
    prompt
}
