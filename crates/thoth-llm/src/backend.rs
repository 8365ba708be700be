//! LLM backend trait and concrete implementations. Every backend routes
//! its HTTP traffic through a [`thoth_gateway::Gateway`] service rather
//! than a bare `reqwest::Client`, so LLM calls get the same rate
//! limiting, caching, retry, and circuit breaking as every other
//! outbound call (spec §4.5, §6.2).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use thoth_gateway::Gateway;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("gateway error: {0}")]
    Gateway(#[from] thoth_common::ThothError),
    #[error("structured output decode failed after repair attempt: {0}")]
    StructuredDecodeFailed(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages, model: None, max_tokens: None, temperature: None }
    }

    /// Appends a repair instruction as an extra user turn; used by the
    /// structured-decode retry (see `structured.rs`).
    pub fn with_extra_user_turn(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError>;
    fn model_id(&self) -> &str;
    fn is_local(&self) -> bool;
    fn max_context_tokens(&self) -> usize;
    fn max_output_tokens(&self) -> usize;
}

/// An Ollama (or any OpenAI-compatible-on-localhost) backend, reached
/// through the gateway's `service` registration rather than a direct URL.
pub struct OllamaBackend {
    gateway: Arc<Gateway>,
    service: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(gateway: Arc<Gateway>, service: impl Into<String>, model: impl Into<String>) -> Self {
        Self { gateway, service: service.into(), model: model.into() }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = serde_json::json!({
            "model": req.model.as_deref().unwrap_or(&self.model),
            "messages": req.messages,
            "max_tokens": req.max_tokens.unwrap_or(4096),
            "temperature": req.temperature.unwrap_or(0.1),
        });

        let json = self.gateway.post(&self.service, "/v1/chat/completions", Some(body)).await?;
        Ok(parse_openai_style_response(&json, &self.model))
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            let body = serde_json::json!({"model": &self.model, "input": text});
            let json = self.gateway.post(&self.service, "/v1/embeddings", Some(body)).await?;
            let vec: Vec<f32> = serde_json::from_value(json["data"][0]["embedding"].clone())?;
            embeddings.push(vec);
        }
        Ok(embeddings)
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn is_local(&self) -> bool {
        true
    }

    fn max_context_tokens(&self) -> usize {
        32768
    }

    fn max_output_tokens(&self) -> usize {
        8192
    }
}

/// An OpenAI-compatible remote backend (OpenAI, Anthropic-via-proxy,
/// or any hosted gateway that speaks the same `/chat/completions`
/// shape). Authentication happens via the gateway's allowlisted
/// `SandboxClient`, not a bearer header built here — the API key is
/// attached as a request header through the gateway's service config.
pub struct OpenAiBackend {
    gateway: Arc<Gateway>,
    service: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(gateway: Arc<Gateway>, service: impl Into<String>, model: impl Into<String>) -> Self {
        Self { gateway, service: service.into(), model: model.into() }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = serde_json::json!({
            "model": req.model.as_deref().unwrap_or(&self.model),
            "messages": req.messages,
            "max_tokens": req.max_tokens.unwrap_or(4096),
            "temperature": req.temperature.unwrap_or(0.1),
        });

        let json = self.gateway.post(&self.service, "/chat/completions", Some(body)).await?;
        Ok(parse_openai_style_response(&json, &self.model))
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let body = serde_json::json!({"model": &self.model, "input": texts});
        let json = self.gateway.post(&self.service, "/embeddings", Some(body)).await?;
        let embeddings: Vec<Vec<f32>> = json["data"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .iter()
            .map(|item| serde_json::from_value(item["embedding"].clone()).unwrap_or_default())
            .collect();
        Ok(embeddings)
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn is_local(&self) -> bool {
        false
    }

    fn max_context_tokens(&self) -> usize {
        128_000
    }

    fn max_output_tokens(&self) -> usize {
        16_384
    }
}

fn parse_openai_style_response(json: &serde_json::Value, default_model: &str) -> LlmResponse {
    LlmResponse {
        content: json["choices"][0]["message"]["content"].as_str().unwrap_or("").to_string(),
        model: json["model"].as_str().unwrap_or(default_model).to_string(),
        prompt_tokens: json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    }
}
