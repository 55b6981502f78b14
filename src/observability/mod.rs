//! Observability: structured logging, process-wide metrics and the
//! health/metrics HTTP endpoints.

pub mod health;
pub mod logging;
pub mod metrics;

pub use health::{HealthCheck, HealthCheckResult, HealthReporter, LlmProviderHealthCheck};
pub use logging::{init_default_logging, init_logging, LogFormat};
pub use metrics::{metrics, MetricsCollector, MetricsSnapshot};

pub use logging::{agent_call_span, request_span};
