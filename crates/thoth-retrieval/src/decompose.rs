//! Multi-hop query decomposition (spec §4.4 step 1a): one LLM call
//! splits a complex question into independently-answerable sub-queries.

use thoth_llm::{LlmBackend, LlmRequest, Message};

const MAX_SUB_QUERIES: usize = 4;

pub async fn decompose_query(llm: &dyn LlmBackend, query: &str) -> Vec<String> {
    let prompt = format!(
        "Decompose this complex research question into 2-4 simpler sub-questions \
         that can be answered independently.\n\n\
         Each sub-question should focus on a specific aspect of the original question.\n\n\
         Original Question: {query}\n\n\
         Sub-Questions (one per line):"
    );

    let request = LlmRequest::new(vec![Message::user(prompt)]);

    match llm.complete(request).await {
        Ok(response) => {
            let sub_queries = parse_sub_queries(&response.content);
            if sub_queries.is_empty() {
                vec![query.to_string()]
            } else {
                sub_queries
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "query decomposition failed, using original query");
            vec![query.to_string()]
        }
    }
}

fn parse_sub_queries(content: &str) -> Vec<String> {
    content
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(strip_leading_numbering)
        .take(MAX_SUB_QUERIES)
        .collect()
}

/// Strips a leading `"1. "` or `"2) "` style marker, if present.
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
            unimplemented!("not exercised in this test")
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
    async fn numbered_response_is_parsed_and_limited_to_four() {
        let backend = ScriptedBackend {
            reply: "1. What datasets were used?\n2) What architecture was chosen?\n\
                    3. How was it evaluated?\n4. What are the limitations?\n5. Extra line"
                .to_string(),
        };
        let sub_queries = decompose_query(&backend, "Compare the methodology across sections").await;
        assert_eq!(sub_queries.len(), 4);
        assert_eq!(sub_queries[0], "What datasets were used?");
        assert_eq!(sub_queries[1], "What architecture was chosen?");
    }

    #[tokio::test]
    async fn backend_error_falls_back_to_original_query() {
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

        let sub_queries = decompose_query(&FailingBackend, "original question").await;
        assert_eq!(sub_queries, vec!["original question".to_string()]);
    }
}
