//! thoth-llm — LLM backend abstraction, role-based routing, and the
//! typed-decoder layer for structured output (spec §4.2, §4.6, §9).

pub mod audit;
pub mod backend;
pub mod router;
pub mod structured;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message, OllamaBackend, OpenAiBackend};
pub use router::LlmRouter;
pub use structured::complete_structured;
