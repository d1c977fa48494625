//! Prometheus metrics for the issuance pipeline.
//!
//! All metrics follow the naming convention: `vc_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., worker_tasks_processed_total)
//! - **Gauge**: Value that can go up or down (e.g., queue_depth)
//! - **Histogram**: Distribution of values (e.g., worker_task_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts,
    HistogramVec, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // QUEUE METRICS
    // =========================================================================

    /// Tasks enqueued through the queue service
    pub static ref TASKS_ENQUEUED: CounterVec = CounterVec::new(
        Opts::new("vc_queue_tasks_enqueued_total", "Total tasks enqueued"),
        &["queue"]
    ).expect("metric creation failed");

    /// Pending tasks per queue, sampled by the queue service
    pub static ref QUEUE_DEPTH: GaugeVec = GaugeVec::new(
        Opts::new("vc_queue_depth", "Pending tasks per queue"),
        &["queue"]
    ).expect("metric creation failed");

    // =========================================================================
    // WORKER METRICS
    // =========================================================================

    /// Tasks consumed, successful or not
    pub static ref TASKS_PROCESSED: CounterVec = CounterVec::new(
        Opts::new("vc_worker_tasks_processed_total", "Total tasks consumed by workers"),
        &["queue"]
    ).expect("metric creation failed");

    /// Tasks whose decode or handler failed
    pub static ref TASKS_FAILED: CounterVec = CounterVec::new(
        Opts::new("vc_worker_tasks_failed_total", "Tasks that failed to decode or process"),
        &["queue", "stage"]  // stage: decode/handle
    ).expect("metric creation failed");

    /// Handler latency
    pub static ref TASK_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "vc_worker_task_duration_seconds",
            "Time spent handling one task"
        ).buckets(exponential_buckets(0.0005, 2.0, 14).expect("bucket creation failed")),
        &["queue"]
    ).expect("metric creation failed");

    // =========================================================================
    // SIGNING METRICS
    // =========================================================================

    /// Documents signed by the authority
    pub static ref DOCUMENTS_SIGNED: Counter = Counter::new(
        "vc_signing_documents_signed_total",
        "Total documents signed"
    ).expect("metric creation failed");

    /// Sign requests that failed
    pub static ref SIGNING_FAILURES: Counter = Counter::new(
        "vc_signing_failures_total",
        "Total failed sign requests"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Queue
        Box::new(TASKS_ENQUEUED.clone()),
        Box::new(QUEUE_DEPTH.clone()),
        // Worker
        Box::new(TASKS_PROCESSED.clone()),
        Box::new(TASKS_FAILED.clone()),
        Box::new(TASK_DURATION.clone()),
        // Signing
        Box::new(DOCUMENTS_SIGNED.clone()),
        Box::new(SIGNING_FAILURES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_counter_by_queue() {
        TASKS_PROCESSED.with_label_values(&["test_queue"]).inc();
        assert!(TASKS_PROCESSED.with_label_values(&["test_queue"]).get() >= 1.0);
    }

    #[test]
    fn test_gather_contains_registered_metrics() {
        register_metrics().unwrap();
        DOCUMENTS_SIGNED.inc();
        QUEUE_DEPTH.with_label_values(&["ladok_sign"]).set(3.0);

        let text = gather_metrics().unwrap();
        assert!(text.contains("vc_signing_documents_signed_total"));
        assert!(text.contains("vc_queue_depth{queue=\"ladok_sign\"} 3"));
    }

    #[test]
    fn test_histogram_timer() {
        let histogram = TASK_DURATION.with_label_values(&["timer_test"]);
        {
            let _timer = HistogramTimer::new(&histogram);
        }
        assert_eq!(histogram.get_sample_count(), 1);
    }
}
