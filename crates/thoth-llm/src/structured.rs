//! Typed-decoder layer for LLM structured output (spec §9): decode the
//! model's response as JSON into a target type, validate it, and on
//! failure make exactly one repair attempt with a stricter prompt
//! before giving up. Used by the analysis step (spec §4.2 step 3), the
//! citation-extraction step (step 4), and the query-driven filter's
//! `QueryEvaluation` decode (spec §4.6 step 2).

use serde::de::DeserializeOwned;

use crate::backend::{LlmBackend, LlmError, LlmRequest};

/// Extracts a JSON object from model output that may be wrapped in
/// markdown code fences, a common LLM habit this layer has to tolerate.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(fenced) = trimmed.strip_prefix("```json") {
        return fenced.trim_end_matches("```").trim();
    }
    if let Some(fenced) = trimmed.strip_prefix("```") {
        return fenced.trim_end_matches("```").trim();
    }
    trimmed
}

/// Decodes a structured response, validating it with `validate`. On
/// parse or validation failure, retries once with a repair instruction
/// appended describing what went wrong; a second failure is a hard
/// error (caller decides whether that's a soft-fail per spec §4.2 step
/// 3: "after that, fail the step").
pub async fn complete_structured<T: DeserializeOwned>(
    backend: &dyn LlmBackend,
    request: LlmRequest,
    validate: impl Fn(&T) -> Result<(), String>,
) -> Result<T, LlmError> {
    let response = backend.complete(request.clone()).await?;

    match decode_and_validate(&response.content, &validate) {
        Ok(value) => Ok(value),
        Err(first_error) => {
            let repair_request = request.with_extra_user_turn(format!(
                "Your previous response was invalid: {first_error}. \
                 Return ONLY a single valid JSON object conforming exactly to the requested schema, \
                 with no prose, no markdown fences, and no trailing text."
            ));
            let repaired = backend.complete(repair_request).await?;
            decode_and_validate(&repaired.content, &validate)
                .map_err(|second_error| LlmError::StructuredDecodeFailed(format!("{first_error}; after repair: {second_error}")))
        }
    }
}

fn decode_and_validate<T: DeserializeOwned>(raw: &str, validate: &impl Fn(&T) -> Result<(), String>) -> Result<T, String> {
    let json_text = extract_json(raw);
    let value: T = serde_json::from_str(json_text).map_err(|e| format!("JSON parse error: {e}"))?;
    validate(&value).map(|()| value).map_err(|e| format!("validation error: {e}"))
}
