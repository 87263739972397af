//! Telemetry, tracing, and metrics for gitstamp.
//!
//! - Structured logging with spans via the `tracing` crate
//! - Per-query metrics for guarded VCS calls
//!
//! # Feature Flags
//!
//! - `telemetry` (default): Full tracing spans and metrics
//! - `release-logs`: Strip debug/trace at compile time
//! - `max-perf`: Disable all tracing for maximum performance

mod init;
pub mod metrics;
mod spans;

pub use init::{init_telemetry, LogFormat, TelemetryConfig, TelemetryGuard, LOG_ENV};
pub use metrics::{
    Histogram, Metrics, MetricsSnapshot, OperationMetrics, QueryMetrics, GLOBAL_METRICS,
    HISTOGRAM_CAPACITY,
};
pub use spans::{SpanExt, VcsSpan};
