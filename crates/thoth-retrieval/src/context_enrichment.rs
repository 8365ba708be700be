//! Contextual chunk enrichment (spec §4.4 optional step): generates a
//! short context blurb per chunk via LLM before indexing, Anthropic's
//! contextual-retrieval technique. Stored in `Chunk::context`, separate
//! from the original `content`, so retrieval can search the enriched
//! text while generation still quotes the original chunk.

use thoth_db::Chunk;
use thoth_llm::{LlmBackend, LlmRequest, Message};

const MAX_DOC_EXCERPT_CHARS: usize = 4000;
const MAX_CONTEXT_CHARS: usize = 500;

/// Enriches every chunk in `chunks`, which are assumed to belong to
/// the same paper — the document excerpt used for context is built by
/// concatenating their own content, since the full source document
/// text isn't available at this seam.
pub async fn enrich_chunks(llm: &dyn LlmBackend, chunks: Vec<Chunk>) -> Vec<Chunk> {
    if chunks.is_empty() {
        return chunks;
    }

    let doc_excerpt = build_document_excerpt(&chunks);

    let mut enriched = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        enriched.push(enrich_single_chunk(llm, chunk, &doc_excerpt).await);
    }
    enriched
}

fn build_document_excerpt(chunks: &[Chunk]) -> String {
    let mut excerpt = String::new();
    for chunk in chunks {
        if excerpt.len() >= MAX_DOC_EXCERPT_CHARS {
            break;
        }
        excerpt.push_str(&chunk.content);
        excerpt.push('\n');
    }
    excerpt.chars().take(MAX_DOC_EXCERPT_CHARS).collect()
}

async fn enrich_single_chunk(llm: &dyn LlmBackend, mut chunk: Chunk, doc_excerpt: &str) -> Chunk {
    let prompt = build_enrichment_prompt(&chunk.content, doc_excerpt);
    let request = LlmRequest::new(vec![Message::user(prompt)]);

    match llm.complete(request).await {
        Ok(response) => {
            let mut context = response.content.trim().to_string();
            if context.len() > MAX_CONTEXT_CHARS {
                tracing::warn!("generated context too long, truncating");
                context.truncate(MAX_CONTEXT_CHARS);
                context.push_str("...");
            }
            chunk.context = Some(context);
            chunk.enriched = true;
            chunk
        }
        Err(err) => {
            tracing::error!(error = %err, chunk_id = %chunk.id, "context generation failed, leaving chunk unenriched");
            chunk
        }
    }
}

fn build_enrichment_prompt(chunk_text: &str, document_excerpt: &str) -> String {
    format!(
        "You are an expert at providing context for document chunks to improve search retrieval.\n\n\
         Given a chunk from a document, provide a brief context (1-2 sentences) that situates \
         this chunk within the overall document. The context should help someone searching for \
         this information find it more easily.\n\n\
         Be concise and specific. Focus on what makes this chunk unique or where it fits in the \
         document structure.\n\n\
         Document Excerpt:\n{document_excerpt}\n\n\
         Chunk to Contextualize:\n{chunk_text}\n\n\
         Brief Context (1-2 sentences):"
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
    async fn successful_enrichment_sets_context_and_flag() {
        let backend = ScriptedBackend { reply: "This chunk describes the evaluation methodology.".to_string() };
        let enriched = enrich_chunks(&backend, vec![test_chunk("raw chunk content")]).await;
        assert!(enriched[0].enriched);
        assert_eq!(enriched[0].context.as_deref(), Some("This chunk describes the evaluation methodology."));
        assert_eq!(enriched[0].content, "raw chunk content");
    }

    #[tokio::test]
    async fn backend_error_leaves_chunk_unenriched() {
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
        let enriched = enrich_chunks(&FailingBackend, vec![test_chunk("raw chunk content")]).await;
        assert!(!enriched[0].enriched);
        assert!(enriched[0].context.is_none());
    }

    #[tokio::test]
    async fn empty_input_returns_empty() {
        let backend = ScriptedBackend { reply: "context".to_string() };
        let enriched = enrich_chunks(&backend, vec![]).await;
        assert!(enriched.is_empty());
    }
}
