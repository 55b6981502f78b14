//! Health and metrics endpoints served next to every agent's JSON-RPC route
//!
//! `GET /health` aggregates the registered component checks; `GET /metrics`
//! exports the global [`MetricsCollector`](super::metrics::MetricsCollector)
//! snapshot.

use crate::a2a::types::utc_timestamp;
use crate::llm::provider::LlmProvider;
use crate::observability::metrics::metrics;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use warp::http::StatusCode;
use warp::Filter;

/// Health check result
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub component: String,
    pub healthy: bool,
    pub message: Option<String>,
    pub response_time_ms: Option<u64>,
}

/// Trait for components that can be health checked
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Perform health check on this component
    async fn health_check(&self) -> HealthCheckResult;

    /// Get the component name for reporting
    fn component_name(&self) -> &str;
}

/// LLM provider health check implementation
pub struct LlmProviderHealthCheck {
    llm_provider: Arc<dyn LlmProvider>,
}

impl LlmProviderHealthCheck {
    pub fn new(llm_provider: Arc<dyn LlmProvider>) -> Self {
        Self { llm_provider }
    }
}

#[async_trait]
impl HealthCheck for LlmProviderHealthCheck {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let component = self.component_name().to_string();
        let result = self.llm_provider.health_check().await;
        let response_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                debug!(
                    provider = self.llm_provider.name(),
                    response_time_ms, "LLM provider healthy"
                );
                HealthCheckResult {
                    component,
                    healthy: true,
                    message: Some(format!("{} provider healthy", self.llm_provider.name())),
                    response_time_ms: Some(response_time_ms),
                }
            }
            Err(e) => {
                warn!(
                    provider = self.llm_provider.name(),
                    error = %e,
                    response_time_ms,
                    "LLM provider health check failed"
                );
                HealthCheckResult {
                    component,
                    healthy: false,
                    message: Some(format!(
                        "{} provider error: {}",
                        self.llm_provider.name(),
                        e
                    )),
                    response_time_ms: Some(response_time_ms),
                }
            }
        }
    }

    fn component_name(&self) -> &str {
        "llm_provider"
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub agent: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub checks: BTreeMap<String, HealthCheckResult>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Aggregates component checks for one agent
#[derive(Clone)]
pub struct HealthReporter {
    agent: String,
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl HealthReporter {
    pub fn new<S: Into<String>>(agent: S) -> Self {
        Self {
            agent: agent.into(),
            checks: Vec::new(),
        }
    }

    pub fn add_health_check(&mut self, check: Arc<dyn HealthCheck>) {
        self.checks.push(check);
    }

    /// Run every registered check; an agent with no checks is healthy
    pub async fn status(&self) -> HealthStatus {
        let mut checks = BTreeMap::new();
        for check in &self.checks {
            let result = check.health_check().await;
            checks.insert(result.component.clone(), result);
        }

        let healthy = checks.values().all(|c| c.healthy);
        HealthStatus {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            agent: self.agent.clone(),
            timestamp: utc_timestamp(),
            uptime_seconds: metrics().get_metrics().uptime_seconds,
            checks,
        }
    }
}

/// `GET /health` and `GET /metrics`
pub fn routes(
    reporter: Arc<HealthReporter>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let health_route = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(move || {
            let reporter = reporter.clone();
            async move {
                let status = reporter.status().await;
                let code = if status.is_healthy() {
                    StatusCode::OK
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                };
                Ok::<_, Infallible>(warp::reply::with_status(warp::reply::json(&status), code))
            }
        });

    let metrics_route = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&metrics().get_metrics()));

    health_route.or(metrics_route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::MockLlmProvider;

    #[tokio::test]
    async fn test_llm_provider_health_check_healthy() {
        let provider = Arc::new(MockLlmProvider::single_response("ok"));
        let check = LlmProviderHealthCheck::new(provider);

        let result = check.health_check().await;
        assert_eq!(result.component, "llm_provider");
        assert!(result.healthy);
        assert!(result.response_time_ms.is_some());
    }

    #[tokio::test]
    async fn test_llm_provider_health_check_unhealthy() {
        let provider = Arc::new(MockLlmProvider::with_failure());
        let check = LlmProviderHealthCheck::new(provider);

        let result = check.health_check().await;
        assert!(!result.healthy);
        assert!(result.message.unwrap().contains("mock"));
    }

    #[tokio::test]
    async fn test_reporter_without_checks_is_healthy() {
        let reporter = HealthReporter::new("Canvas Agent");
        let status = reporter.status().await;
        assert!(status.is_healthy());
        assert_eq!(status.agent, "Canvas Agent");
        assert!(status.timestamp.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_reporter_degraded_when_a_check_fails() {
        let mut reporter = HealthReporter::new("Trending Topics Agent");
        reporter.add_health_check(Arc::new(LlmProviderHealthCheck::new(Arc::new(
            MockLlmProvider::with_failure(),
        ))));

        let status = reporter.status().await;
        assert_eq!(status.status, "degraded");
        assert!(status.checks.contains_key("llm_provider"));
    }

    #[tokio::test]
    async fn test_health_route() {
        let filter = routes(Arc::new(HealthReporter::new("Task Agent")));

        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["agent"], "Task Agent");
    }

    #[tokio::test]
    async fn test_health_route_unavailable_when_degraded() {
        let mut reporter = HealthReporter::new("Host");
        reporter.add_health_check(Arc::new(LlmProviderHealthCheck::new(Arc::new(
            MockLlmProvider::with_failure(),
        ))));
        let filter = routes(Arc::new(reporter));

        let response = warp::test::request().path("/health").reply(&filter).await;
        assert_eq!(response.status(), 503);
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let filter = routes(Arc::new(HealthReporter::new("x")));

        let response = warp::test::request().path("/metrics").reply(&filter).await;
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert!(body["requests"]["received"].is_u64());
        assert!(body["outbound"]["webhooks_sent"].is_u64());
    }
}
