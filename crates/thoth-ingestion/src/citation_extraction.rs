//! Citation extraction (spec §4.2 step 4): a second LLM call returns an
//! ordered list of citations from the full markdown. The call is split
//! map-reduce style over sections when the text exceeds the backend's
//! context budget, each part extracted independently and the results
//! concatenated in document order.

use serde::{Deserialize, Serialize};
use thoth_llm::{complete_structured, LlmBackend, LlmError, LlmRequest, Message};

const SYSTEM_PROMPT: &str = "Extract every citation referenced in the following text, in the order \
they first appear. Return ONLY a JSON object of the form \
{\"citations\": [{\"raw\": string, \"title\": string|null, \"authors\": [string], \
\"year\": number|null, \"doi\": string|null, \"arxiv_id\": string|null}]}.";

#[derive(Debug, Deserialize)]
struct ExtractedCitations {
    citations: Vec<ExtractedCitation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedCitation {
    pub raw: String,
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub year: Option<i64>,
    pub doi: Option<String>,
    pub arxiv_id: Option<String>,
}

/// Characters per part kept well under a typical 8K-token context
/// budget, leaving room for the system prompt and response.
const MAX_CHARS_PER_CALL: usize = 24_000;

/// Extracts citations from `markdown`, splitting into context-sized
/// parts and concatenating the per-part results in order.
pub async fn extract_citations(backend: &dyn LlmBackend, markdown: &str) -> Result<Vec<ExtractedCitation>, LlmError> {
    let parts = split_for_context_budget(markdown, MAX_CHARS_PER_CALL);
    let mut all = Vec::new();

    for part in parts {
        let request = LlmRequest::new(vec![Message::system(SYSTEM_PROMPT.to_string()), Message::user(part)]);
        let extracted: ExtractedCitations = complete_structured(backend, request, |_: &ExtractedCitations| Ok(())).await?;
        all.extend(extracted.citations);
    }

    Ok(all)
}

/// Splits text on paragraph boundaries into chunks no larger than
/// `max_chars`, never splitting mid-paragraph.
fn split_for_context_budget(text: &str, max_chars: usize) -> Vec<String> {
    if text.len() <= max_chars {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    for paragraph in text.split("\n\n") {
        if !current.is_empty() && current.len() + paragraph.len() + 2 > max_chars {
            parts.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_part() {
        let parts = split_for_context_budget("hello world", MAX_CHARS_PER_CALL);
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn long_text_splits_on_paragraph_boundaries() {
        let paragraph = "word ".repeat(1000);
        let text = format!("{paragraph}\n\n{paragraph}\n\n{paragraph}");
        let parts = split_for_context_budget(&text, 3000);
        assert!(parts.len() > 1);
        for part in &parts {
            assert!(part.len() <= 3000 + paragraph.len());
        }
    }
}
