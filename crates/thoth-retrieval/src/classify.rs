//! Query classification (spec §4.4 step 1): routes a query to
//! direct-answer, standard, or multi-hop retrieval using the same
//! heuristic keyword lists as the rest of this family of routers.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    DirectAnswer,
    StandardRag,
    MultiHopRag,
}

const DIRECT_KEYWORDS: &[&str] = &["what is", "who is", "define", "meaning of"];
const RESEARCH_KEYWORDS: &[&str] = &["paper", "study", "research", "experiment", "dataset"];
const MULTI_HOP_KEYWORDS: &[&str] =
    &["compare", "contrast", "relate", "synthesize", "implications", "across", "between", "versus", "vs"];

/// Heuristic classification. `query_based_routing` gates this the way
/// `QueryRouter.enabled` does in the original: disabled always routes
/// standard.
pub fn classify_query(query: &str, query_based_routing: bool) -> QueryType {
    if !query_based_routing {
        return QueryType::StandardRag;
    }

    let lower = query.to_lowercase();

    if DIRECT_KEYWORDS.iter().any(|kw| lower.contains(kw))
        && !RESEARCH_KEYWORDS.iter().any(|kw| lower.contains(kw))
    {
        return QueryType::DirectAnswer;
    }

    if MULTI_HOP_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return QueryType::MultiHopRag;
    }

    QueryType::StandardRag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_routing_always_returns_standard() {
        assert_eq!(classify_query("what is entropy", false), QueryType::StandardRag);
    }

    #[test]
    fn general_knowledge_question_is_direct_answer() {
        assert_eq!(classify_query("What is machine learning?", true), QueryType::DirectAnswer);
    }

    #[test]
    fn paper_specific_question_is_not_direct_answer() {
        assert_eq!(classify_query("What is the dataset used in this paper?", true), QueryType::StandardRag);
    }

    #[test]
    fn comparison_question_is_multi_hop() {
        assert_eq!(classify_query("Compare approach A versus approach B", true), QueryType::MultiHopRag);
    }

    #[test]
    fn plain_question_is_standard_rag() {
        assert_eq!(classify_query("Summarize the methodology section", true), QueryType::StandardRag);
    }
}
