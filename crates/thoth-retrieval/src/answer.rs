//! Answer generation (spec §4.4 step 7): turns the final chunk set into
//! a grounded answer, citing which chunks it drew from.

use thoth_db::Chunk;
use thoth_llm::{LlmBackend, LlmError, LlmRequest, Message};
use uuid::Uuid;

#[derive(Debug, Clone, serde::Serialize)]
pub struct GeneratedAnswer {
    pub text: String,
    pub source_chunk_ids: Vec<Uuid>,
}

const SYSTEM_PROMPT: &str = "You are a research assistant. Answer the user's question using \
only the information in the provided context. If the context does not contain enough \
information to answer, say so explicitly rather than guessing.";

pub async fn generate_answer(llm: &dyn LlmBackend, query: &str, context_chunks: &[Chunk]) -> Result<GeneratedAnswer, LlmError> {
    let context = context_chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Source {}]\n{}", i + 1, chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = format!("Context:\n{context}\n\nQuestion: {query}\n\nAnswer:");
    let request = LlmRequest::new(vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)]);

    let response = llm.complete(request).await?;
    Ok(GeneratedAnswer { text: response.content, source_chunk_ids: context_chunks.iter().map(|c| c.id).collect() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

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

    #[tokio::test]
    async fn answer_carries_source_chunk_ids() {
        let backend = ScriptedBackend { reply: "The answer is 42.".to_string() };
        let chunk = Chunk::new(Uuid::new_v4(), 0, "text".to_string(), "some context".to_string());
        let chunk_id = chunk.id;
        let answer = generate_answer(&backend, "what is the answer?", &[chunk]).await.unwrap();
        assert_eq!(answer.text, "The answer is 42.");
        assert_eq!(answer.source_chunk_ids, vec![chunk_id]);
    }
}
