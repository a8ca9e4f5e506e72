//! Metric instruments for workq.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without a provider installed every instrument is a no-op.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for workq instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("workq")
}

/// Instruments owned by one queue, built once at construction.
#[derive(Clone)]
pub struct QueueMetrics {
    submitted: Counter<u64>,
    processed: Counter<u64>,
    duration_ms: Histogram<f64>,
    stops: Counter<u64>,
}

impl QueueMetrics {
    pub fn new() -> Self {
        let meter = meter();
        Self {
            submitted: meter
                .u64_counter("workq.tasks.submitted")
                .with_description("Number of tasks submitted")
                .build(),
            processed: meter
                .u64_counter("workq.tasks.processed")
                .with_description("Number of tasks settled by a runner")
                .build(),
            duration_ms: meter
                .f64_histogram("workq.task.duration_ms")
                .with_description("Handler duration in milliseconds")
                .with_unit("ms")
                .build(),
            stops: meter
                .u64_counter("workq.runner.stops")
                .with_description("Number of stop requests")
                .build(),
        }
    }

    /// Labels: `admission` ("created" | "attached" | "requeued").
    pub fn record_submitted(&self, admission: &'static str) {
        self.submitted
            .add(1, &[KeyValue::new("admission", admission)]);
    }

    /// Labels: `result` ("ok" | "error").
    pub fn record_processed(&self, ok: bool, duration_ms: f64) {
        let result = KeyValue::new("result", if ok { "ok" } else { "error" });
        self.processed.add(1, std::slice::from_ref(&result));
        self.duration_ms.record(duration_ms, &[result]);
    }

    pub fn record_stop(&self) {
        self.stops.add(1, &[]);
    }
}

impl Default for QueueMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueueMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueMetrics").finish_non_exhaustive()
    }
}
