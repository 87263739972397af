//! Span helpers for inspector operations.

#[cfg(feature = "telemetry")]
use tracing::Span;

/// Helper for VCS operation spans.
pub struct VcsSpan;

impl VcsSpan {
    /// Create a span for an inspector operation rooted at `start_path`.
    #[cfg(feature = "telemetry")]
    pub fn new(operation: &str, start_path: &str) -> Span {
        tracing::info_span!(
            "vcs_operation",
            operation = %operation,
            start_path = %start_path,
            success = tracing::field::Empty,
            duration_ms = tracing::field::Empty
        )
    }

    #[cfg(not(feature = "telemetry"))]
    pub fn new(_operation: &str, _start_path: &str) -> NoOpSpan {
        NoOpSpan
    }
}

/// No-op span when telemetry is disabled.
#[derive(Clone)]
#[allow(dead_code)]
pub struct NoOpSpan;

#[allow(dead_code)]
impl NoOpSpan {
    pub fn record<T>(&self, _field: &str, _value: T) {}

    pub fn enter(&self) -> NoOpGuard {
        NoOpGuard
    }
}

/// No-op guard when telemetry is disabled.
#[allow(dead_code)]
pub struct NoOpGuard;

/// Extension trait for spans.
pub trait SpanExt {
    /// Record success status on the span.
    fn record_success(&self, success: bool);

    /// Record duration in milliseconds on the span.
    fn record_duration_ms(&self, duration_ms: f64);
}

#[cfg(feature = "telemetry")]
impl SpanExt for Span {
    fn record_success(&self, success: bool) {
        self.record("success", success);
    }

    fn record_duration_ms(&self, duration_ms: f64) {
        self.record("duration_ms", duration_ms);
    }
}

#[cfg(not(feature = "telemetry"))]
impl SpanExt for NoOpSpan {
    fn record_success(&self, _success: bool) {}
    fn record_duration_ms(&self, _duration_ms: f64) {}
}
