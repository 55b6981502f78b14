//! Structured logging system using tracing crate
//!
//! ## Environment Variables
//!
//! - `LOG_LEVEL`: Log level (ERROR, WARN, INFO, DEBUG, TRACE) - defaults to INFO
//! - `LOG_FORMAT`: Output format (json, pretty, compact) - defaults to json
//! - `LOG_SPANS`: Include span events (true/false) - defaults to false
//! - `RUST_LOG`: Override log filtering (follows env_logger format)
//!
//! ```bash
//! LOG_FORMAT=pretty LOG_LEVEL=DEBUG a2a-agents serve trending
//! ```

use std::env;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format for structured logging (machine-readable)
    Json,
    /// Pretty format with colors and indentation (human-readable)
    Pretty,
    /// Compact format with colors but minimal spacing (terminal-friendly)
    Compact,
}

impl LogFormat {
    /// Parse log format from string, defaulting to JSON
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

/// Parse a level name, defaulting to INFO
pub fn parse_level(s: &str) -> Level {
    match s.to_uppercase().as_str() {
        "ERROR" => Level::ERROR,
        "WARN" => Level::WARN,
        "DEBUG" => Level::DEBUG,
        "TRACE" => Level::TRACE,
        _ => Level::INFO,
    }
}

/// Level after applying `-v` flags on top of a base level
pub fn raise_level(base: Level, verbosity: u8) -> Level {
    // tracing orders levels by verbosity: TRACE is the greatest
    let requested = match verbosity {
        0 => return base,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    base.max(requested)
}

fn build_filter(level: Level) -> EnvFilter {
    if let Ok(rust_log) = env::var("RUST_LOG") {
        if let Ok(filter) = EnvFilter::try_new(rust_log) {
            return filter;
        }
    }

    // Reduce noise from the HTTP stack
    EnvFilter::try_new(format!("{level},hyper=warn,reqwest=warn,warp=warn"))
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}

/// Initialize logging with manual configuration.
///
/// Calling it twice is harmless; the second subscriber is ignored.
pub fn init_logging(level: Level, format: LogFormat, include_spans: bool) {
    let span_events = if include_spans {
        fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
    } else {
        fmt::format::FmtSpan::NONE
    };

    let subscriber = tracing_subscriber::registry().with(build_filter(level));

    let result = match format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_span_events(span_events))
            .try_init(),
        LogFormat::Pretty => subscriber
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(true)
                    .with_span_events(span_events),
            )
            .try_init(),
        LogFormat::Compact => subscriber
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(true)
                    .with_target(false)
                    .with_span_events(span_events),
            )
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

/// Initialize logging from environment variables plus CLI verbosity
pub fn init_default_logging(verbosity: u8) {
    let level = parse_level(&env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()));
    let format = LogFormat::parse(&env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()));
    let include_spans = env::var("LOG_SPANS")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    init_logging(raise_level(level, verbosity), format, include_spans);
}

/// Span for one incoming JSON-RPC request handled by an agent
#[macro_export]
macro_rules! request_span {
    ($($field:tt)*) => {
        tracing::info_span!("agent_request", $($field)*)
    };
}

/// Span for an outbound call to another A2A agent or a webhook receiver
#[macro_export]
macro_rules! agent_call_span {
    ($($field:tt)*) => {
        tracing::info_span!("agent_call", $($field)*)
    };
}

pub use {agent_call_span, request_span};
