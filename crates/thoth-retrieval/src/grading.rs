//! Binary relevance grading (spec §4.4 step 4): a fast yes/no LLM call
//! per candidate chunk, fail-open on any error or unclear answer so a
//! flaky grader never starves the pipeline of context.

use thoth_llm::{LlmBackend, LlmRequest, Message};
use thoth_db::Chunk;

/// A graded chunk plus the binary verdict that produced its bucket.
pub struct GradedChunk {
    pub chunk: Chunk,
    pub relevant: bool,
}

/// Grades every candidate against `query`, splitting into (relevant,
/// irrelevant). Each chunk is graded independently; one grading
/// failure never affects another chunk's verdict.
pub async fn grade_chunks(llm: &dyn LlmBackend, query: &str, chunks: Vec<Chunk>) -> (Vec<Chunk>, Vec<Chunk>) {
    let mut relevant = Vec::new();
    let mut irrelevant = Vec::new();

    for chunk in chunks {
        if grade_single_chunk(llm, query, &chunk).await {
            relevant.push(chunk);
        } else {
            irrelevant.push(chunk);
        }
    }

    (relevant, irrelevant)
}

/// Truncates chunk content to the first 800 chars before grading, same
/// budget as the rest of this family of graders.
const MAX_GRADING_CHARS: usize = 800;

async fn grade_single_chunk(llm: &dyn LlmBackend, query: &str, chunk: &Chunk) -> bool {
    let content: String = chunk.content.chars().take(MAX_GRADING_CHARS).collect();
    let prompt = format!(
        "Is this document relevant to answering the query? Answer ONLY 'yes' or 'no'.\n\n\
         Query: {query}\n\n\
         Document Content:\n{content}\n\n\
         Relevant (yes/no):"
    );

    let request = LlmRequest::new(vec![Message::user(prompt)]);

    match llm.complete(request).await {
        Ok(response) => parse_yes_no(&response.content),
        Err(err) => {
            tracing::warn!(error = %err, chunk_id = %chunk.id, "document grading error, defaulting to relevant");
            true
        }
    }
}

/// Checks the first 10 chars only, same window the rest of this
/// family of yes/no graders uses.
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
            Ok(thoth_llm::LlmResponse {
                content: self.reply.clone(),
                model: "scripted".to_string(),
                prompt_tokens: 0,
                completion_tokens: 0,
            })
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

    fn test_chunk(content: &str) -> Chunk {
        Chunk::new(Uuid::new_v4(), 0, "text".to_string(), content.to_string())
    }

    #[tokio::test]
    async fn yes_response_is_relevant() {
        let backend = ScriptedBackend { reply: "Yes.".to_string() };
        let (relevant, irrelevant) = grade_chunks(&backend, "q", vec![test_chunk("some text")]).await;
        assert_eq!(relevant.len(), 1);
        assert!(irrelevant.is_empty());
    }

    #[tokio::test]
    async fn no_response_is_irrelevant() {
        let backend = ScriptedBackend { reply: "no".to_string() };
        let (relevant, irrelevant) = grade_chunks(&backend, "q", vec![test_chunk("some text")]).await;
        assert!(relevant.is_empty());
        assert_eq!(irrelevant.len(), 1);
    }

    #[tokio::test]
    async fn unclear_response_fails_open_to_relevant() {
        let backend = ScriptedBackend { reply: "maybe, hard to tell from this context".to_string() };
        let (relevant, irrelevant) = grade_chunks(&backend, "q", vec![test_chunk("some text")]).await;
        assert_eq!(relevant.len(), 1);
        assert!(irrelevant.is_empty());
    }

    #[tokio::test]
    async fn backend_error_fails_open_to_relevant() {
        let (relevant, irrelevant) = grade_chunks(&FailingBackend, "q", vec![test_chunk("some text")]).await;
        assert_eq!(relevant.len(), 1);
        assert!(irrelevant.is_empty());
    }

    #[tokio::test]
    async fn each_chunk_is_graded_independently() {
        let backend = ScriptedBackend { reply: "yes".to_string() };
        let (relevant, _) = grade_chunks(&backend, "q", vec![test_chunk("a"), test_chunk("b"), test_chunk("c")]).await;
        assert_eq!(relevant.len(), 3);
    }
}
