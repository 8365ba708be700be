//! Query-driven article filter (spec §4.6): decides whether a discovered
//! article is worth downloading, against every stored [`ResearchQuery`].
//!
//! 1. Quick keyword-overlap score per query ([`crate::scorer::quick_score`]).
//! 2. For each query whose quick score clears the filter's configured
//!    `quick_score_threshold` (0.0 clears every query unconditionally),
//!    an LLM evaluator call produces a structured [`QueryEvaluation`].
//! 3. Aggregate: `best_score` is the highest evaluated relevance score;
//!    `matching_queries` are the queries whose relevance score clears
//!    their own threshold.
//! 4. Decide: download iff at least one query matches, else skip. Zero
//!    configured queries is a distinct "nothing to filter against" case.
//! 5. If downloading and the caller asked for the PDF, fetch it into an
//!    incoming directory.
//! 6. Record a [`ScrapeDecision`] in the append-only decision log.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thoth_common::sandbox::SandboxClient;
use thoth_llm::{complete_structured, LlmBackend, LlmRequest, Message};

use crate::decision_log::{Decision, DecisionLog, ScrapeDecision};
use crate::error::Result;
use crate::query_store::{QueryStore, ResearchQuery};
use crate::scorer::quick_score;

/// The "nothing to filter against" reasoning recorded when no research
/// queries are configured at all (distinct from every query rejecting
/// the article).
pub const NO_QUERIES_REASON: &str = "No research queries configured for filtering";

/// Metadata pulled from a discovered (not-yet-downloaded) article,
/// enough to score and evaluate it without fetching the PDF first.
#[derive(Debug, Clone)]
pub struct ArticleMetadata {
    pub fingerprint: String,
    pub title: String,
    pub abstract_text: String,
    pub keywords: Vec<String>,
    pub pdf_url: Option<String>,
}

impl ArticleMetadata {
    fn scoring_text(&self) -> String {
        format!("{} {}", self.title, self.abstract_text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Keep,
    Reject,
    Review,
}

/// Structured LLM judgment for one article against one query (field set
/// mirrors the evaluator response the filtering pipeline was distilled
/// from).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryEvaluation {
    pub relevance_score: f64,
    pub meets_criteria: bool,
    pub keyword_matches: Vec<String>,
    pub topic_analysis: String,
    pub methodology_match: Option<String>,
    pub reasoning: String,
    pub recommendation: Recommendation,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub decision: Decision,
    pub best_score: f64,
    pub matching_queries: Vec<String>,
    pub evaluations: Vec<(String, QueryEvaluation)>,
    pub pdf_downloaded: bool,
    pub pdf_path: Option<String>,
    pub reasoning: String,
}

pub struct ArticleFilter {
    query_store: QueryStore,
    decision_log: DecisionLog,
    llm: Arc<dyn LlmBackend>,
    sandbox: SandboxClient,
    /// Quick-score gate below which a query skips its LLM evaluation
    /// entirely (spec §4.6 step 2). `0.0` evaluates every query.
    quick_score_threshold: f64,
}

impl ArticleFilter {
    pub fn new(query_store: QueryStore, decision_log: DecisionLog, llm: Arc<dyn LlmBackend>, quick_score_threshold: f64) -> Result<Self> {
        Ok(Self { query_store, decision_log, llm, sandbox: SandboxClient::new()?, quick_score_threshold })
    }

    pub async fn process_article(&self, metadata: &ArticleMetadata, download_pdf: bool, incoming_dir: &Path) -> Result<FilterOutcome> {
        let queries = self.query_store.list_all()?;

        if queries.is_empty() {
            let outcome = FilterOutcome {
                decision: Decision::Skip,
                best_score: 0.0,
                matching_queries: Vec::new(),
                evaluations: Vec::new(),
                pdf_downloaded: false,
                pdf_path: None,
                reasoning: NO_QUERIES_REASON.to_string(),
            };
            self.log_decision(metadata, &outcome, &std::collections::HashMap::new())?;
            return Ok(outcome);
        }

        let text = metadata.scoring_text();
        let quick_scores: Vec<(ResearchQuery, f64)> =
            queries.into_iter().map(|q| { let s = quick_score(&q, &text, &metadata.keywords); (q, s) }).collect();

        let mut evaluations: Vec<(String, QueryEvaluation)> = Vec::new();
        for (query, score) in &quick_scores {
            if self.quick_score_threshold > 0.0 && *score <= self.quick_score_threshold {
                continue;
            }
            match self.evaluate_with_llm(query, metadata).await {
                Ok(evaluation) => evaluations.push((query.name.clone(), evaluation)),
                Err(err) => tracing::warn!(query = %query.name, error = %err, "query evaluation failed, skipping query"),
            }
        }

        let query_by_name: std::collections::HashMap<&str, &ResearchQuery> =
            quick_scores.iter().map(|(q, _)| (q.name.as_str(), q)).collect();

        let mut matching: Vec<(String, f64)> = evaluations
            .iter()
            .filter_map(|(name, eval)| {
                let threshold = query_by_name.get(name.as_str()).map(|q| q.minimum_relevance_score).unwrap_or(0.0);
                let rounded = round_to_3(eval.relevance_score);
                (rounded >= round_to_3(threshold)).then_some((name.clone(), rounded))
            })
            .collect();

        // Deterministic tie-break: highest score first, ties favor the
        // lexicographically-first query name.
        matching.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));

        let best_score = evaluations
            .iter()
            .map(|(_, eval)| round_to_3(eval.relevance_score))
            .fold(0.0_f64, f64::max);
        let matching_names: Vec<String> = matching.into_iter().map(|(name, _)| name).collect();

        let decision = if matching_names.is_empty() { Decision::Skip } else { Decision::Download };
        let reasoning = if matching_names.is_empty() {
            "no query met its minimum relevance score".to_string()
        } else {
            format!("matched queries: {}", matching_names.join(", "))
        };

        let mut outcome = FilterOutcome {
            decision,
            best_score,
            matching_queries: matching_names,
            evaluations,
            pdf_downloaded: false,
            pdf_path: None,
            reasoning,
        };

        if outcome.decision == Decision::Download && download_pdf {
            if let Some(url) = &metadata.pdf_url {
                match self.fetch_pdf(url, &metadata.fingerprint, incoming_dir).await {
                    Ok(path) => {
                        outcome.pdf_downloaded = true;
                        outcome.pdf_path = Some(path.to_string_lossy().to_string());
                    }
                    Err(err) => tracing::warn!(fingerprint = %metadata.fingerprint, error = %err, "pdf download failed, decision stands"),
                }
            }
        }

        let quick_score_map: std::collections::HashMap<String, f64> = quick_scores.iter().map(|(q, s)| (q.name.clone(), *s)).collect();
        self.log_decision(metadata, &outcome, &quick_score_map)?;
        Ok(outcome)
    }

    async fn evaluate_with_llm(&self, query: &ResearchQuery, metadata: &ArticleMetadata) -> Result<QueryEvaluation> {
        let system_prompt = build_evaluation_prompt(query);
        let user_prompt = format!(
            "Title: {}\n\nAbstract: {}\n\nKeywords: {}",
            metadata.title,
            metadata.abstract_text,
            metadata.keywords.join(", ")
        );
        let request = LlmRequest::new(vec![Message::system(system_prompt), Message::user(user_prompt)]);

        let evaluation = complete_structured(self.llm.as_ref(), request, |eval: &QueryEvaluation| {
            if !(0.0..=1.0).contains(&eval.relevance_score) {
                return Err("relevance_score must be between 0 and 1".to_string());
            }
            if !(0.0..=1.0).contains(&eval.confidence) {
                return Err("confidence must be between 0 and 1".to_string());
            }
            Ok(())
        })
        .await?;
        Ok(evaluation)
    }

    async fn fetch_pdf(&self, url: &str, fingerprint: &str, incoming_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(incoming_dir)?;
        let request = self.sandbox.get(url)?;
        let response = request.send().await.map_err(thoth_common::ThothError::Http)?;
        let bytes = response.bytes().await.map_err(thoth_common::ThothError::Http)?;

        let path = incoming_dir.join(format!("{fingerprint}.pdf"));
        std::fs::write(&path, &bytes)?;
        Ok(path)
    }

    fn log_decision(&self, metadata: &ArticleMetadata, outcome: &FilterOutcome, quick_scores: &std::collections::HashMap<String, f64>) -> Result<()> {
        self.decision_log.append(&ScrapeDecision {
            article_fingerprint: metadata.fingerprint.clone(),
            query_scores: quick_scores.clone(),
            decision: outcome.decision,
            reasoning: outcome.reasoning.clone(),
            pdf_path: outcome.pdf_path.clone(),
            timestamp: chrono::Utc::now(),
        })
    }
}

fn build_evaluation_prompt(query: &ResearchQuery) -> String {
    let mut prompt = format!(
        "You are evaluating whether an academic paper is relevant to this research query.\n\nResearch question: {}\n",
        query.research_question
    );
    if !query.required_topics.is_empty() {
        prompt.push_str(&format!("Required topics (must be present): {}\n", query.required_topics.join(", ")));
    }
    if !query.keywords.is_empty() {
        prompt.push_str(&format!("Keywords of interest: {}\n", query.keywords.join(", ")));
    }
    if !query.preferred_topics.is_empty() {
        prompt.push_str(&format!("Preferred (bonus) topics: {}\n", query.preferred_topics.join(", ")));
    }
    if !query.excluded_topics.is_empty() {
        prompt.push_str(&format!("Excluded topics (penalize if present): {}\n", query.excluded_topics.join(", ")));
    }
    if !query.methodology_preferences.is_empty() {
        prompt.push_str(&format!("Preferred methodology: {}\n", query.methodology_preferences.join(", ")));
    }
    prompt.push_str(
        "\nReturn a single JSON object with fields: relevance_score (0-1), meets_criteria (bool), \
         keyword_matches (array of strings), topic_analysis (string), methodology_match (string or null), \
         reasoning (string), recommendation (one of \"keep\", \"reject\", \"review\"), confidence (0-1).",
    );
    prompt
}

fn round_to_3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use thoth_llm::{LlmError, LlmResponse};

    use super::*;

    /// Returns a single scripted reply for every `complete` call, enough
    /// to exercise `ArticleFilter` without a live LLM.
    struct ScriptedBackend {
        reply: &'static str,
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn complete(&self, _req: LlmRequest) -> Result<LlmResponse, LlmError> {
            Ok(LlmResponse { content: self.reply.to_string(), model: "stub".to_string(), prompt_tokens: 1, completion_tokens: 1 })
        }

        async fn embed(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
            unimplemented!()
        }

        fn model_id(&self) -> &str {
            "stub"
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

    fn sample_metadata() -> ArticleMetadata {
        ArticleMetadata {
            fingerprint: "fp1".to_string(),
            title: "Machine learning for genomics".to_string(),
            abstract_text: "We apply transformer attention models to genomic sequences.".to_string(),
            keywords: vec!["genomics".to_string()],
            pdf_url: None,
        }
    }

    #[tokio::test]
    async fn no_queries_configured_skips_with_marker_reason() {
        let dir = tempfile::tempdir().unwrap();
        let query_store = QueryStore::new(dir.path().join("queries"));
        let decision_log = DecisionLog::new(dir.path().join("decisions.jsonl"));
        let llm = Arc::new(ScriptedBackend { reply: "{}" }) as Arc<dyn LlmBackend>;
        let filter = ArticleFilter::new(query_store, decision_log, llm, 0.0).unwrap();

        let outcome = filter.process_article(&sample_metadata(), false, dir.path()).await.unwrap();

        assert_eq!(outcome.decision, Decision::Skip);
        assert_eq!(outcome.reasoning, NO_QUERIES_REASON);
    }

    #[tokio::test]
    async fn matching_query_above_threshold_yields_download() {
        let dir = tempfile::tempdir().unwrap();
        let query_store = QueryStore::new(dir.path().join("queries"));
        let mut query = ResearchQuery::new("ml_genomics", "d", "how is ML used in genomics?");
        query.required_topics = vec!["machine learning".to_string()];
        query.minimum_relevance_score = 0.5;
        query_store.save(query).unwrap();

        let decision_log = DecisionLog::new(dir.path().join("decisions.jsonl"));
        let reply = r#"{"relevance_score": 0.9, "meets_criteria": true, "keyword_matches": ["machine learning"],
            "topic_analysis": "on topic", "methodology_match": null, "reasoning": "clear match",
            "recommendation": "keep", "confidence": 0.8}"#;
        let llm = Arc::new(ScriptedBackend { reply }) as Arc<dyn LlmBackend>;
        let filter = ArticleFilter::new(query_store, decision_log, llm, 0.0).unwrap();

        let outcome = filter.process_article(&sample_metadata(), false, dir.path()).await.unwrap();

        assert_eq!(outcome.decision, Decision::Download);
        assert_eq!(outcome.matching_queries, vec!["ml_genomics".to_string()]);
        assert_eq!(outcome.best_score, 0.9);
    }
}
