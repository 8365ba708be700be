//! Knowledge-strip refinement (spec §4.4 step 6, CRAG ambiguous branch):
//! decomposes a chunk into individual factual statements, keeps only
//! the ones relevant to the query, and recomposes a leaner chunk.

use thoth_llm::{LlmBackend, LlmRequest, Message};
use thoth_db::Chunk;

const MAX_STRIPS_PER_DOCUMENT: usize = 20;
const MIN_CONTENT_LEN_FOR_DECOMPOSITION: usize = 50;
const MAX_DECOMPOSITION_INPUT_CHARS: usize = 2000;

/// Refines each chunk; a chunk with zero relevant strips is dropped.
/// Decomposition failure falls back to the original chunk unchanged.
pub async fn refine_chunks(llm: &dyn LlmBackend, query: &str, chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut refined = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match refine_single_chunk(llm, query, &chunk).await {
            Some(refined_chunk) => refined.push(refined_chunk),
            None => {}
        }
    }
    refined
}

async fn refine_single_chunk(llm: &dyn LlmBackend, query: &str, chunk: &Chunk) -> Option<Chunk> {
    let strips = decompose_to_strips(llm, &chunk.content).await;
    if strips.is_empty() {
        return Some(chunk.clone());
    }

    let relevant_strips = filter_strips(llm, query, &strips).await;
    if relevant_strips.is_empty() {
        return None;
    }

    let mut refined_chunk = chunk.clone();
    refined_chunk.content = relevant_strips.join("\n\n");
    Some(refined_chunk)
}

async fn decompose_to_strips(llm: &dyn LlmBackend, content: &str) -> Vec<String> {
    if content.len() < MIN_CONTENT_LEN_FOR_DECOMPOSITION {
        return vec![content.to_string()];
    }

    let truncated: String = content.chars().take(MAX_DECOMPOSITION_INPUT_CHARS).collect();
    let prompt = format!(
        "Break this text into individual factual statements. Each statement should be:\n\
         - Self-contained (understandable without other statements)\n\
         - Factual (not opinions or questions)\n\
         - Concise (one claim per statement)\n\n\
         Output ONLY the factual statements, one per line. No numbering, no explanations.\n\n\
         Text:\n{truncated}\n\n\
         Factual statements:"
    );

    let request = LlmRequest::new(vec![Message::user(prompt)]);
    match llm.complete(request).await {
        Ok(response) => {
            let strips: Vec<String> = response
                .content
                .trim()
                .lines()
                .map(str::trim)
                .filter(|line| line.len() > 10)
                .map(strip_leading_numbering)
                .take(MAX_STRIPS_PER_DOCUMENT)
                .collect();
            strips
        }
        Err(err) => {
            tracing::error!(error = %err, "strip decomposition failed, keeping original content");
            vec![content.to_string()]
        }
    }
}

async fn filter_strips(llm: &dyn LlmBackend, query: &str, strips: &[String]) -> Vec<String> {
    let mut relevant = Vec::new();
    for strip in strips {
        if grade_strip(llm, query, strip).await {
            relevant.push(strip.clone());
        }
    }
    relevant
}

async fn grade_strip(llm: &dyn LlmBackend, query: &str, strip: &str) -> bool {
    let prompt = format!(
        "Is this statement relevant to answering the query? Answer ONLY 'yes' or 'no'.\n\n\
         Query: {query}\n\n\
         Statement: {strip}\n\n\
         Relevant (yes/no):"
    );
    let request = LlmRequest::new(vec![Message::user(prompt)]);
    match llm.complete(request).await {
        Ok(response) => parse_yes_no(&response.content),
        Err(err) => {
            tracing::error!(error = %err, "strip grading error, defaulting to relevant");
            true
        }
    }
}

/// Checks the first 10 chars only, matching `grading.rs`'s window.
fn parse_yes_no(content: &str) -> bool {
    let lowered = content.trim().to_lowercase();
    let window: String = lowered.chars().take(10).collect();
    if window.contains("yes") {
        true
    } else if window.contains("no") {
        false
    } else {
        true
    }
}

fn strip_leading_numbering(line: &str) -> String {
    let trimmed = line.trim_start();
    let digits_end = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(0);
    if digits_end == 0 {
        return trimmed.to_string();
    }
    let rest = &trimmed[digits_end..];
    if let Some(after_marker) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        after_marker.trim_start().to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use thoth_llm::LlmError;
    use uuid::Uuid;

    struct ScriptedBackend {
        replies: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn complete(&self, _req: LlmRequest) -> Result<thoth_llm::LlmResponse, LlmError> {
            let mut replies = self.replies.lock().unwrap();
            let content = if replies.is_empty() { "yes".to_string() } else { replies.remove(0) };
            Ok(thoth_llm::LlmResponse { content, model: "scripted".to_string(), prompt_tokens: 0, completion_tokens: 0 })
        }
        async fn embed(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
            unimplemented!()
        }
        fn model_id(&self) -> &str {
            "scripted"
        }
        fn is_local(&self) -> bool {
            true
        }
        fn max_context_tokens(&self) -> usize {
            8192
        }
        fn max_output_tokens(&self) -> usize {
            2048
        }
    }

    fn test_chunk(content: &str) -> Chunk {
        Chunk::new(Uuid::new_v4(), 0, "text".to_string(), content.to_string())
    }

    #[tokio::test]
    async fn short_content_skips_decomposition_and_survives_if_relevant() {
        let backend = ScriptedBackend { replies: std::sync::Mutex::new(vec!["yes".to_string()]) };
        let refined = refine_chunks(&backend, "q", vec![test_chunk("too short")]).await;
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].content, "too short");
    }

    #[tokio::test]
    async fn all_strips_irrelevant_drops_the_chunk() {
        let long_content = "a".repeat(60);
        let backend = ScriptedBackend {
            replies: std::sync::Mutex::new(vec!["First statement.\nSecond statement.".to_string(), "no".to_string(), "no".to_string()]),
        };
        let refined = refine_chunks(&backend, "q", vec![test_chunk(&long_content)]).await;
        assert!(refined.is_empty());
    }

    #[tokio::test]
    async fn relevant_strips_are_recomposed() {
        let long_content = "a".repeat(60);
        let backend = ScriptedBackend {
            replies: std::sync::Mutex::new(vec![
                "First statement here.\nSecond statement here.".to_string(),
                "yes".to_string(),
                "no".to_string(),
            ]),
        };
        let refined = refine_chunks(&backend, "q", vec![test_chunk(&long_content)]).await;
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].content, "First statement here.");
    }
}
