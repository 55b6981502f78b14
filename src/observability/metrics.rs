//! Thread-safe metrics collection
//!
//! Atomic counters for request handling, outbound webhooks and remote agent
//! calls, plus a bounded window of task durations for latency percentiles.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

const MAX_PROCESSING_SAMPLES: usize = 1000;

/// Thread-safe metrics collector using atomics and mutexes
pub struct MetricsCollector {
    requests_received: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_input_required: AtomicU64,

    webhooks_sent: AtomicU64,
    webhooks_failed: AtomicU64,

    remote_agent_calls: AtomicU64,
    remote_agent_failures: AtomicU64,

    llm_requests: AtomicU64,
    llm_failures: AtomicU64,

    // in milliseconds
    processing_times: Mutex<Vec<u64>>,
    requests_by_method: Mutex<HashMap<String, u64>>,

    uptime_start: AtomicU64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            requests_received: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            tasks_input_required: AtomicU64::new(0),
            webhooks_sent: AtomicU64::new(0),
            webhooks_failed: AtomicU64::new(0),
            remote_agent_calls: AtomicU64::new(0),
            remote_agent_failures: AtomicU64::new(0),
            llm_requests: AtomicU64::new(0),
            llm_failures: AtomicU64::new(0),
            processing_times: Mutex::new(Vec::new()),
            requests_by_method: Mutex::new(HashMap::new()),
            uptime_start: AtomicU64::new(current_timestamp()),
        }
    }

    /// Record an incoming JSON-RPC call
    pub fn request_received(&self, method: &str) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut by_method) = self.requests_by_method.lock() {
            *by_method.entry(method.to_string()).or_insert(0) += 1;
        }
    }

    pub fn task_completed(&self, duration: Duration) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        self.record_processing_time(duration);
    }

    pub fn task_failed(&self, duration: Duration) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        self.record_processing_time(duration);
    }

    pub fn task_input_required(&self) {
        self.tasks_input_required.fetch_add(1, Ordering::Relaxed);
    }

    pub fn webhook_sent(&self, delivered: bool) {
        self.webhooks_sent.fetch_add(1, Ordering::Relaxed);
        if !delivered {
            self.webhooks_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn remote_agent_called(&self, success: bool) {
        self.remote_agent_calls.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.remote_agent_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn llm_request(&self, success: bool) {
        self.llm_requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.llm_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_processing_time(&self, duration: Duration) {
        if let Ok(mut times) = self.processing_times.lock() {
            times.push(duration.as_millis() as u64);
            if times.len() > MAX_PROCESSING_SAMPLES {
                let excess = times.len() - MAX_PROCESSING_SAMPLES;
                times.drain(..excess);
            }
        }
    }

    fn processing_time_statistics(&self) -> (f64, f64, f64) {
        let Ok(times) = self.processing_times.lock() else {
            return (0.0, 0.0, 0.0);
        };
        if times.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let mut sorted = times.clone();
        sorted.sort_unstable();
        let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;
        (avg, percentile(&sorted, 50.0), percentile(&sorted, 95.0))
    }

    /// Clear every counter (tests and long-running demos)
    pub fn reset(&self) {
        for counter in [
            &self.requests_received,
            &self.tasks_completed,
            &self.tasks_failed,
            &self.tasks_input_required,
            &self.webhooks_sent,
            &self.webhooks_failed,
            &self.remote_agent_calls,
            &self.remote_agent_failures,
            &self.llm_requests,
            &self.llm_failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        if let Ok(mut times) = self.processing_times.lock() {
            times.clear();
        }
        if let Ok(mut by_method) = self.requests_by_method.lock() {
            by_method.clear();
        }
        self.uptime_start
            .store(current_timestamp(), Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        let (avg, p50, p95) = self.processing_time_statistics();
        let now = current_timestamp();
        let requests_by_method = self
            .requests_by_method
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default();

        MetricsSnapshot {
            requests: RequestMetrics {
                received: self.requests_received.load(Ordering::Relaxed),
                by_method: requests_by_method,
            },
            tasks: TaskMetrics {
                completed: self.tasks_completed.load(Ordering::Relaxed),
                failed: self.tasks_failed.load(Ordering::Relaxed),
                input_required: self.tasks_input_required.load(Ordering::Relaxed),
                avg_processing_time_ms: avg,
                processing_time_p50_ms: p50,
                processing_time_p95_ms: p95,
            },
            outbound: OutboundMetrics {
                webhooks_sent: self.webhooks_sent.load(Ordering::Relaxed),
                webhooks_failed: self.webhooks_failed.load(Ordering::Relaxed),
                remote_agent_calls: self.remote_agent_calls.load(Ordering::Relaxed),
                remote_agent_failures: self.remote_agent_failures.load(Ordering::Relaxed),
                llm_requests: self.llm_requests.load(Ordering::Relaxed),
                llm_failures: self.llm_failures.load(Ordering::Relaxed),
            },
            uptime_seconds: now.saturating_sub(self.uptime_start.load(Ordering::Relaxed)),
            timestamp: now,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests: RequestMetrics,
    pub tasks: TaskMetrics,
    pub outbound: OutboundMetrics,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestMetrics {
    pub received: u64,
    pub by_method: HashMap<String, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskMetrics {
    pub completed: u64,
    pub failed: u64,
    pub input_required: u64,
    pub avg_processing_time_ms: f64,
    pub processing_time_p50_ms: f64,
    pub processing_time_p95_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundMetrics {
    pub webhooks_sent: u64,
    pub webhooks_failed: u64,
    pub remote_agent_calls: u64,
    pub remote_agent_failures: u64,
    pub llm_requests: u64,
    pub llm_failures: u64,
}

pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let len = sorted_data.len();
    let index = (percentile / 100.0) * (len - 1) as f64;

    if index.fract() == 0.0 {
        sorted_data[index as usize] as f64
    } else {
        let lower = sorted_data[index.floor() as usize] as f64;
        let upper = sorted_data[index.ceil() as usize] as f64;
        lower + (upper - lower) * index.fract()
    }
}
