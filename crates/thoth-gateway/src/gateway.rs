use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use thoth_common::sandbox::SandboxClient;
use thoth_common::{Result, ThothError};

use crate::cache::ResponseCache;
use crate::circuit::CircuitBreaker;
use crate::rate_limiter::TokenBucket;
use crate::retry::RetryPolicy;

/// Static per-service configuration: where it lives and how long its
/// responses may be cached.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub cache_ttl: Duration,
}

struct ServiceState {
    config: ServiceConfig,
    rate_limiter: TokenBucket,
    circuit: CircuitBreaker,
}

/// The single choke point for all outbound HTTP to research APIs (spec
/// §4.5). Named services resolve to base URLs registered up front;
/// unknown service names fail fast rather than falling through to an
/// arbitrary URL.
pub struct Gateway {
    services: HashMap<String, ServiceState>,
    sandbox: SandboxClient,
    cache: ResponseCache,
    retry_policy: RetryPolicy,
    requests_per_sec_floor: f64,
    circuit_failure_threshold: u32,
    circuit_cooldown: Duration,
}

pub struct GatewayBuilder {
    services: HashMap<String, ServiceConfig>,
    retry_policy: RetryPolicy,
    requests_per_sec_floor: f64,
    circuit_failure_threshold: u32,
    circuit_cooldown: Duration,
    cache_max_entries: usize,
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self {
            services: HashMap::new(),
            retry_policy: RetryPolicy::default(),
            requests_per_sec_floor: 1.0,
            circuit_failure_threshold: 5,
            circuit_cooldown: Duration::from_secs(30),
            cache_max_entries: 1024,
        }
    }
}

impl GatewayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service(mut self, name: impl Into<String>, config: ServiceConfig) -> Self {
        self.services.insert(name.into(), config);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn requests_per_sec_floor(mut self, floor: f64) -> Self {
        self.requests_per_sec_floor = floor;
        self
    }

    pub fn circuit_breaker(mut self, failure_threshold: u32, cooldown: Duration) -> Self {
        self.circuit_failure_threshold = failure_threshold;
        self.circuit_cooldown = cooldown;
        self
    }

    pub fn build(self) -> Result<Gateway> {
        let sandbox = SandboxClient::new()?;
        let mut services = HashMap::new();
        for (name, config) in self.services {
            services.insert(
                name,
                ServiceState {
                    config,
                    rate_limiter: TokenBucket::new(self.requests_per_sec_floor.max(1.0), self.requests_per_sec_floor),
                    circuit: CircuitBreaker::new(self.circuit_failure_threshold, self.circuit_cooldown),
                },
            );
        }
        Ok(Gateway {
            services,
            sandbox,
            cache: ResponseCache::new(self.cache_max_entries),
            retry_policy: self.retry_policy,
            requests_per_sec_floor: self.requests_per_sec_floor,
            circuit_failure_threshold: self.circuit_failure_threshold,
            circuit_cooldown: self.circuit_cooldown,
        })
    }
}

impl Gateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Registers a new service at runtime (e.g. a discovery-configured
    /// mirror), reusing the gateway's global rate/circuit defaults.
    pub fn register_service(&mut self, name: impl Into<String>, config: ServiceConfig) {
        self.services.insert(
            name.into(),
            ServiceState {
                config,
                rate_limiter: TokenBucket::new(self.requests_per_sec_floor.max(1.0), self.requests_per_sec_floor),
                circuit: CircuitBreaker::new(self.circuit_failure_threshold, self.circuit_cooldown),
            },
        );
    }

    pub async fn get(&self, service: &str, path: &str, params: &[(&str, &str)]) -> Result<serde_json::Value> {
        self.request(reqwest::Method::GET, service, path, params, None).await
    }

    pub async fn post(&self, service: &str, path: &str, body: Option<serde_json::Value>) -> Result<serde_json::Value> {
        self.request(reqwest::Method::POST, service, path, &[], body).await
    }

    async fn request(
        &self,
        method: reqwest::Method,
        service: &str,
        path: &str,
        params: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let state = self
            .services
            .get(service)
            .ok_or_else(|| ThothError::InputInvalid(format!("unknown gateway service: {service}")))?;

        let mut sorted_params: Vec<(&str, &str)> = params.to_vec();
        sorted_params.sort_unstable();
        let sorted_params_str = sorted_params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");

        let mut url = format!("{}{}", state.config.base_url.trim_end_matches('/'), path);
        if !sorted_params_str.is_empty() {
            url.push('?');
            url.push_str(&sorted_params_str);
        }

        let body_bytes = body.as_ref().map(|b| serde_json::to_vec(b).unwrap_or_default()).unwrap_or_default();
        let cache_key = ResponseCache::cache_key(method.as_str(), &url, &sorted_params_str, &body_bytes);

        if method == reqwest::Method::GET {
            if let Some(cached) = self.cache.get(&cache_key) {
                return Ok(cached);
            }
        }

        if state.circuit.is_open() {
            return Err(ThothError::GatewayCircuitOpen { service: service.to_string() });
        }

        state.rate_limiter.acquire().await;

        let mut last_err = None;
        for attempt in 0..self.retry_policy.max_attempts {
            let mut builder = self.sandbox.request(method.clone(), &url)?;
            if let Some(ref b) = body {
                builder = builder.json(b);
            }

            let outcome = builder.send().await;

            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        state.circuit.record_success();
                        let json: serde_json::Value = response.json().await.map_err(ThothError::Http)?;
                        if method == reqwest::Method::GET {
                            self.cache.put(cache_key.clone(), json.clone(), state.config.cache_ttl);
                        }
                        return Ok(json);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .map(Duration::from_secs);
                        last_err = Some(ThothError::GatewayRateLimited {
                            service: service.to_string(),
                            retry_after_secs: retry_after.map(|d| d.as_secs()),
                        });
                        if attempt + 1 < self.retry_policy.max_attempts {
                            tokio::time::sleep(self.retry_policy.delay_for(attempt, retry_after)).await;
                            continue;
                        }
                        break;
                    }

                    if status.is_client_error() {
                        state.circuit.record_failure();
                        return Err(ThothError::Other(anyhow::anyhow!("gateway request to {service} failed with {status}")));
                    }

                    // 5xx: retriable.
                    last_err = Some(ThothError::Other(anyhow::anyhow!("gateway request to {service} failed with {status}")));
                    if attempt + 1 < self.retry_policy.max_attempts {
                        tokio::time::sleep(self.retry_policy.delay_for(attempt, None)).await;
                        continue;
                    }
                }
                Err(err) => {
                    last_err = Some(ThothError::Http(err));
                    if attempt + 1 < self.retry_policy.max_attempts {
                        tokio::time::sleep(self.retry_policy.delay_for(attempt, None)).await;
                        continue;
                    }
                }
            }
        }

        state.circuit.record_failure();
        Err(last_err.unwrap_or_else(|| ThothError::Other(anyhow::anyhow!("gateway request to {service} exhausted retries"))))
    }
}

/// Holds named-service registration separately from `Gateway` so tests
/// can construct one without a live sandbox allowlist round trip.
pub fn default_services() -> HashMap<&'static str, &'static str> {
    let mut m = HashMap::new();
    m.insert("semantic_scholar", "https://api.semanticscholar.org/graph/v1");
    m.insert("opencitations", "https://opencitations.net/index/api/v2");
    m.insert("arxiv", "https://export.arxiv.org/api");
    m.insert("crossref", "https://api.crossref.org");
    m.insert("unpaywall", "https://api.unpaywall.org/v2");
    m.insert("pubmed", "https://eutils.ncbi.nlm.nih.gov/entrez/eutils");
    m.insert("openalex", "https://api.openalex.org");
    m.insert("biorxiv", "https://api.biorxiv.org/details/biorxiv");
    m
}
