//! Quick keyword-overlap scoring (spec §4.6 step 1): a cheap pre-filter
//! computed before any LLM call, so only articles that clear a
//! configurable threshold (or all of them, when the threshold is 0)
//! pay for a structured evaluation.

use crate::query_store::ResearchQuery;

const REQUIRED_WEIGHT: f64 = 0.4;
const KEYWORD_WEIGHT: f64 = 0.4;
const PREFERRED_WEIGHT: f64 = 0.2;

/// Case-insensitive substring-or-keyword-list match.
fn topic_present(haystack_lower: &str, article_keywords_lower: &[String], topic: &str) -> bool {
    let topic_lower = topic.to_lowercase();
    haystack_lower.contains(&topic_lower) || article_keywords_lower.iter().any(|k| k == &topic_lower)
}

/// Fraction of `topics` found in the article text or keyword list. An
/// empty topic list is treated as fully satisfied — an unset
/// requirement restricts nothing.
fn match_fraction(haystack_lower: &str, article_keywords_lower: &[String], topics: &[String]) -> f64 {
    if topics.is_empty() {
        return 1.0;
    }
    let matched = topics.iter().filter(|t| topic_present(haystack_lower, article_keywords_lower, t)).count();
    matched as f64 / topics.len() as f64
}

/// Computes the weighted quick score of one article against one query:
/// `required * 0.4 + keywords * 0.4 + preferred * 0.2`, halved once per
/// excluded-topic hit, rounded to 3 decimals (spec §4.6 steps 1 and 6's
/// "deterministic tie-breaks" note).
pub fn quick_score(query: &ResearchQuery, article_text: &str, article_keywords: &[String]) -> f64 {
    let haystack_lower = article_text.to_lowercase();
    let article_keywords_lower: Vec<String> = article_keywords.iter().map(|k| k.to_lowercase()).collect();

    let required = match_fraction(&haystack_lower, &article_keywords_lower, &query.required_topics);
    let keywords = match_fraction(&haystack_lower, &article_keywords_lower, &query.keywords);
    let preferred = match_fraction(&haystack_lower, &article_keywords_lower, &query.preferred_topics);

    let mut score = required * REQUIRED_WEIGHT + keywords * KEYWORD_WEIGHT + preferred * PREFERRED_WEIGHT;

    for excluded in &query.excluded_topics {
        if topic_present(&haystack_lower, &article_keywords_lower, excluded) {
            score *= 0.5;
        }
    }

    round_to_3(score.clamp(0.0, 1.0))
}

fn round_to_3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_query() -> ResearchQuery {
        let mut q = ResearchQuery::new("ml", "d", "r");
        q.required_topics = vec!["machine learning".to_string()];
        q.keywords = vec!["transformer".to_string(), "attention".to_string()];
        q.preferred_topics = vec!["benchmark".to_string()];
        q.excluded_topics = vec!["hardware".to_string()];
        q
    }

    #[test]
    fn full_match_scores_near_one() {
        let query = sample_query();
        let text = "A machine learning paper about attention and transformer architectures, with a benchmark.";
        let score = quick_score(&query, text, &[]);
        assert!(score > 0.9, "expected near-full match, got {score}");
    }

    #[test]
    fn missing_required_topic_caps_the_score() {
        let query = sample_query();
        let text = "A transformer and attention paper with a benchmark, but no biology at all.";
        let score = quick_score(&query, text, &[]);
        assert!(score <= 0.6, "required-topic miss should drop the score, got {score}");
    }

    #[test]
    fn excluded_topic_halves_the_score() {
        let query = sample_query();
        let text = "A machine learning paper about transformer attention and hardware benchmarks.";
        let without_exclusion_query = {
            let mut q = query.clone();
            q.excluded_topics.clear();
            q
        };
        let with_exclusion = quick_score(&query, text, &[]);
        let without_exclusion = quick_score(&without_exclusion_query, text, &[]);
        assert!((with_exclusion - without_exclusion / 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_query_topics_never_restrict_the_score() {
        let query = ResearchQuery::new("anything", "d", "r");
        let score = quick_score(&query, "completely unrelated text", &[]);
        assert_eq!(score, 1.0);
    }
}
