//! Post-generation groundedness check (spec §4.4 step 8): verifies a
//! generated answer is supported by its source chunks before it ships.
//! Fails open on every ambiguous case except the one where there is
//! nothing to ground against.

use thoth_db::Chunk;
use thoth_llm::{LlmBackend, LlmRequest, Message};

const MAX_SOURCE_CHARS: usize = 3000;

const NEGATIVE_INDICATORS: &[&str] =
    &["not supported", "not grounded", "hallucination", "fabricated", "unsupported claim", "no evidence"];

#[derive(Debug, Clone)]
pub struct GroundingVerdict {
    pub is_grounded: bool,
    pub explanation: String,
}

/// `strict` tightens the verification prompt to reject any unsupported
/// claim; lenient mode tolerates minor contextual additions. Neither
/// mode changes the ambiguous-verdict fallback, which always defaults
/// to grounded.
pub async fn check_answer(llm: &dyn LlmBackend, query: &str, answer: &str, sources: &[Chunk], strict: bool) -> GroundingVerdict {
    if answer.trim().is_empty() {
        return GroundingVerdict { is_grounded: true, explanation: "Empty answer, no claims to verify".to_string() };
    }

    if sources.is_empty() {
        tracing::warn!("no source documents provided for hallucination check");
        return GroundingVerdict { is_grounded: false, explanation: "No source documents provided".to_string() };
    }

    let combined_sources = combine_sources(sources, MAX_SOURCE_CHARS);
    let prompt = build_verification_prompt(query, answer, &combined_sources, strict);
    let request = LlmRequest::new(vec![Message::user(prompt)]);

    match llm.complete(request).await {
        Ok(response) => parse_verdict(&response.content),
        Err(err) => {
            tracing::error!(error = %err, "hallucination check failed, defaulting to grounded");
            GroundingVerdict { is_grounded: true, explanation: format!("Check failed due to error: {err}") }
        }
    }
}

fn parse_verdict(content: &str) -> GroundingVerdict {
    let result = content.trim().to_string();
    let lower = result.to_lowercase();

    if lower.starts_with("yes") {
        return GroundingVerdict { is_grounded: true, explanation: result };
    }
    if lower.starts_with("no") {
        tracing::warn!(verdict = %result, "hallucination detected");
        return GroundingVerdict { is_grounded: false, explanation: result };
    }

    if NEGATIVE_INDICATORS.iter().any(|ind| lower.contains(ind)) {
        tracing::warn!(verdict = %result, "potential hallucination");
        GroundingVerdict { is_grounded: false, explanation: result }
    } else {
        GroundingVerdict { is_grounded: true, explanation: result }
    }
}

fn combine_sources(chunks: &[Chunk], max_chars: usize) -> String {
    let mut combined = Vec::new();
    let mut total_chars = 0usize;

    for (i, chunk) in chunks.iter().enumerate() {
        let header = format!("[Source {}: chunk {}]\n", i + 1, chunk.chunk_index);
        let remaining = max_chars.saturating_sub(total_chars).saturating_sub(header.len());
        if remaining <= 100 {
            break;
        }

        let content: String = chunk.content.chars().take(remaining).collect();
        total_chars += header.len() + content.len();
        combined.push(format!("{header}{content}\n"));
    }

    combined.join("\n")
}

fn build_verification_prompt(query: &str, answer: &str, sources: &str, strict: bool) -> String {
    let instruction = if strict {
        "Verify that EVERY claim in the answer is directly supported by the source documents.\n\
         Answer 'yes' ONLY if all claims are fully supported. Answer 'no' if ANY claim lacks support."
    } else {
        "Verify that the core claims in the answer are supported by the source documents.\n\
         Minor contextual additions are acceptable. Answer 'yes' if the answer is substantially grounded.\n\
         Answer 'no' if there are major unsupported claims or factual errors."
    };

    format!(
        "{instruction}\n\n\
         Query: {query}\n\n\
         Answer to Verify:\n{answer}\n\n\
         Source Documents:\n{sources}\n\n\
         Is the answer grounded in the source documents? Answer 'yes' or 'no' and briefly explain:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use thoth_llm::LlmError;
    use uuid::Uuid;

    struct ScriptedBackend {
        reply: String,
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn complete(&self, _req: LlmRequest) -> Result<thoth_llm::LlmResponse, LlmError> {
            Ok(thoth_llm::LlmResponse { content: self.reply.clone(), model: "scripted".to_string(), prompt_tokens: 0, completion_tokens: 0 })
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
    async fn empty_answer_is_trivially_grounded() {
        let backend = ScriptedBackend { reply: "irrelevant".to_string() };
        let verdict = check_answer(&backend, "q", "", &[test_chunk("content")], false).await;
        assert!(verdict.is_grounded);
    }

    #[tokio::test]
    async fn no_sources_is_not_grounded() {
        let backend = ScriptedBackend { reply: "yes".to_string() };
        let verdict = check_answer(&backend, "q", "an answer", &[], false).await;
        assert!(!verdict.is_grounded);
    }

    #[tokio::test]
    async fn explicit_yes_is_grounded() {
        let backend = ScriptedBackend { reply: "Yes, fully supported.".to_string() };
        let verdict = check_answer(&backend, "q", "an answer", &[test_chunk("content")], false).await;
        assert!(verdict.is_grounded);
    }

    #[tokio::test]
    async fn explicit_no_is_not_grounded() {
        let backend = ScriptedBackend { reply: "No, this claim is fabricated.".to_string() };
        let verdict = check_answer(&backend, "q", "an answer", &[test_chunk("content")], true).await;
        assert!(!verdict.is_grounded);
    }

    #[tokio::test]
    async fn unclear_verdict_defaults_to_grounded() {
        let backend = ScriptedBackend { reply: "It's hard to say for certain here.".to_string() };
        let verdict = check_answer(&backend, "q", "an answer", &[test_chunk("content")], false).await;
        assert!(verdict.is_grounded);
    }

    #[tokio::test]
    async fn unclear_verdict_with_negative_indicator_is_not_grounded() {
        let backend = ScriptedBackend { reply: "This seems like a hallucination of details.".to_string() };
        let verdict = check_answer(&backend, "q", "an answer", &[test_chunk("content")], false).await;
        assert!(!verdict.is_grounded);
    }

    #[tokio::test]
    async fn backend_error_defaults_to_grounded() {
        struct FailingBackend;
        #[async_trait]
        impl LlmBackend for FailingBackend {
            async fn complete(&self, _req: LlmRequest) -> Result<thoth_llm::LlmResponse, LlmError> {
                Err(LlmError::Unavailable("down".to_string()))
            }
            async fn embed(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
                unimplemented!()
            }
            fn model_id(&self) -> &str {
                "failing"
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
        let verdict = check_answer(&FailingBackend, "q", "an answer", &[test_chunk("content")], false).await;
        assert!(verdict.is_grounded);
    }
}
