//! The retrieval pipeline (spec §4.4): the full agentic flow from a
//! raw query to a grounded answer. Every step fails open — an LLM or
//! index error degrades the result rather than aborting the query.

use std::sync::Arc;

use thoth_config::features::RagFeature;
use thoth_db::{Chunk, ChunkRepository};
use thoth_llm::LlmRouter;
use uuid::Uuid;

use crate::answer::generate_answer;
use crate::classify::{classify_query, QueryType};
use crate::confidence::{evaluate_retrieval_confidence, RetrievalConfidence};
use crate::decompose::decompose_query;
use crate::fulltext::FullTextIndex;
use crate::fusion::reciprocal_rank_fusion;
use crate::grading::grade_chunks;
use crate::hallucination::check_answer;
use crate::refinement::refine_chunks;

#[derive(Debug, Clone, serde::Serialize)]
pub struct RetrievalResult {
    pub answer: String,
    pub source_chunk_ids: Vec<Uuid>,
    pub query_type: QueryType,
    pub confidence: Option<RetrievalConfidence>,
    pub grounded: Option<bool>,
}

pub struct RetrievalPipeline {
    chunks: ChunkRepository,
    fulltext: Arc<FullTextIndex>,
    llm: Arc<LlmRouter>,
    config: RagFeature,
    query_based_routing: bool,
}

impl RetrievalPipeline {
    pub fn new(chunks: ChunkRepository, fulltext: Arc<FullTextIndex>, llm: Arc<LlmRouter>, config: RagFeature, query_based_routing: bool) -> Self {
        Self { chunks, fulltext, llm, config, query_based_routing }
    }

    pub async fn answer(&self, query: &str) -> RetrievalResult {
        let query_type = classify_query(query, self.query_based_routing);

        if query_type == QueryType::DirectAnswer {
            let text = self.answer_directly(query).await;
            return RetrievalResult { answer: text, source_chunk_ids: Vec::new(), query_type, confidence: None, grounded: None };
        }

        let sub_queries = if query_type == QueryType::MultiHopRag {
            match self.llm.backend_for_role("query_routing") {
                Ok(backend) => decompose_query(backend.as_ref(), query).await,
                Err(_) => vec![query.to_string()],
            }
        } else {
            vec![query.to_string()]
        };

        let candidates = self.retrieve_candidates(&sub_queries).await;
        if candidates.is_empty() {
            let text = self.answer_directly(query).await;
            return RetrievalResult { answer: text, source_chunk_ids: Vec::new(), query_type, confidence: None, grounded: None };
        }

        let grading_backend = self.llm.backend_for_role("grading").ok();
        let (relevant, confidence_value) = match &grading_backend {
            Some(backend) => {
                let total = candidates.len();
                let (relevant, _irrelevant) = grade_chunks(backend.as_ref(), query, candidates).await;
                let confidence_value = relevant.len() as f64 / total as f64;
                (relevant, confidence_value)
            }
            None => {
                let len = candidates.len();
                (candidates, if len > 0 { 1.0 } else { 0.0 })
            }
        };

        let confidence =
            evaluate_retrieval_confidence(confidence_value, self.config.confidence_upper_threshold, self.config.confidence_lower_threshold);

        let context_chunks = match confidence {
            RetrievalConfidence::Correct => relevant,
            RetrievalConfidence::Ambiguous => match &grading_backend {
                Some(backend) => refine_chunks(backend.as_ref(), query, relevant).await,
                None => relevant,
            },
            RetrievalConfidence::Incorrect => Vec::new(),
        };

        if context_chunks.is_empty() {
            let text = self.answer_directly(query).await;
            return RetrievalResult {
                answer: text,
                source_chunk_ids: Vec::new(),
                query_type,
                confidence: Some(confidence),
                grounded: None,
            };
        }

        let answer_backend = match self.llm.backend_for_role("answer") {
            Ok(backend) => backend,
            Err(_) => {
                return RetrievalResult {
                    answer: "Unable to generate an answer: no answer backend configured.".to_string(),
                    source_chunk_ids: context_chunks.iter().map(|c| c.id).collect(),
                    query_type,
                    confidence: Some(confidence),
                    grounded: None,
                };
            }
        };

        let generated = match generate_answer(answer_backend.as_ref(), query, &context_chunks).await {
            Ok(generated) => generated,
            Err(err) => {
                tracing::error!(error = %err, "answer generation failed");
                return RetrievalResult {
                    answer: "Unable to generate an answer due to a backend error.".to_string(),
                    source_chunk_ids: context_chunks.iter().map(|c| c.id).collect(),
                    query_type,
                    confidence: Some(confidence),
                    grounded: None,
                };
            }
        };

        let grounded = self.verify_with_retry(query, &generated.text, &context_chunks).await;

        RetrievalResult { answer: generated.text, source_chunk_ids: generated.source_chunk_ids, query_type, confidence: Some(confidence), grounded }
    }

    /// Runs the hallucination check, retrying once with strict mode on
    /// a rejection (spec §4.4 step 8: "if rejected, retry once with
    /// stricter prompting").
    async fn verify_with_retry(&self, query: &str, answer_text: &str, sources: &[Chunk]) -> Option<bool> {
        let hallucination_backend = self.llm.backend_for_role("hallucination_check").ok()?;

        let first = check_answer(hallucination_backend.as_ref(), query, answer_text, sources, self.config.strict_hallucination_mode).await;
        if first.is_grounded {
            return Some(true);
        }

        let retry = check_answer(hallucination_backend.as_ref(), query, answer_text, sources, true).await;
        Some(retry.is_grounded)
    }

    async fn retrieve_candidates(&self, sub_queries: &[String]) -> Vec<Chunk> {
        let mut ranked_lists: Vec<Vec<Uuid>> = Vec::new();
        let mut by_id = std::collections::HashMap::new();

        for sub_query in sub_queries {
            if let Ok(mut vecs) = self.llm.embed(vec![sub_query.clone()]).await {
                if let Some(vector) = vecs.pop() {
                    if let Ok(dense_hits) = self.chunks.search_similar(&vector, self.config.top_k).await {
                        ranked_lists.push(dense_hits.iter().map(|c| c.id).collect());
                        for chunk in dense_hits {
                            by_id.insert(chunk.id, chunk);
                        }
                    }
                }
            }

            if let Ok(lexical_hits) = self.fulltext.search(sub_query, self.config.top_k) {
                ranked_lists.push(lexical_hits.iter().map(|h| h.chunk_id).collect());
                for hit in lexical_hits {
                    if !by_id.contains_key(&hit.chunk_id) {
                        if let Ok(Some(chunk)) = self.chunks.find_by_id(hit.chunk_id).await {
                            by_id.insert(hit.chunk_id, chunk);
                        }
                    }
                }
            }
        }

        let fused = reciprocal_rank_fusion(&ranked_lists, self.config.rrf_k);
        fused.into_iter().filter_map(|(id, _score)| by_id.remove(&id)).take(self.config.top_k).collect()
    }

    async fn answer_directly(&self, query: &str) -> String {
        let Ok(backend) = self.llm.backend_for_role("answer") else {
            return "Unable to generate an answer: no answer backend configured.".to_string();
        };
        match generate_answer(backend.as_ref(), query, &[]).await {
            Ok(generated) => generated.text,
            Err(err) => {
                tracing::error!(error = %err, "direct-answer generation failed");
                "Unable to generate an answer due to a backend error.".to_string()
            }
        }
    }
}
