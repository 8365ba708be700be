//! External API gateway (spec §4.5): one choke point for every outbound
//! HTTP call the core makes, layering rate limiting, response caching,
//! retry with backoff, and a per-service circuit breaker over
//! [`thoth_common::sandbox::SandboxClient`].

pub mod cache;
pub mod circuit;
pub mod gateway;
pub mod rate_limiter;
pub mod retry;

pub use cache::ResponseCache;
pub use circuit::CircuitBreaker;
pub use gateway::{Gateway, GatewayBuilder, ServiceConfig};
pub use rate_limiter::TokenBucket;
pub use retry::RetryPolicy;
