//! Observability infrastructure for the inference service
//!
//! Provides:
//! - A [`MetricsSink`] capability with a Prometheus implementation and a
//!   no-op implementation, chosen at startup
//! - Structured JSON logging with tracing

use anyhow::Result;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Metric names understood by [`PrometheusSink`]
pub mod metric_names {
    /// Histogram: HTTP request latency
    pub const REQUEST_LATENCY: &str = "api_request_duration_seconds";
    /// Counter: HTTP requests by `method`, `endpoint`, `status`
    pub const REQUEST_COUNT: &str = "api_requests_total";
    /// Counter: successful predictions by `model_version`
    pub const PREDICTION_COUNT: &str = "predictions_total";
    /// Counter: rejected or failed predictions by `kind`
    pub const PREDICTION_ERRORS: &str = "prediction_errors_total";
    /// Histogram: pipeline latency
    pub const PREDICTION_LATENCY: &str = "prediction_latency_seconds";
    /// Histogram: model load time
    pub const MODEL_LOAD_TIME: &str = "model_load_duration_seconds";
    /// Counter: reload attempts by `outcome`
    pub const MODEL_RELOADS: &str = "model_reloads_total";
}

/// Content type of the text exposition format
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Destination for service metrics
pub trait MetricsSink: Send + Sync {
    /// Record a histogram observation
    fn observe(&self, histogram: &str, value: f64);

    /// Increment a counter; `labels` are label values in declaration order
    fn increment(&self, counter: &str, labels: &[&str]);

    /// Text exposition of all metrics, or `None` when metrics are disabled
    fn export(&self) -> Result<Option<String>>;
}

/// Sink used when metrics are disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn observe(&self, _histogram: &str, _value: f64) {}

    fn increment(&self, _counter: &str, _labels: &[&str]) {}

    fn export(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Prometheus-backed sink with its own registry
pub struct PrometheusSink {
    registry: Registry,
    histograms: HashMap<&'static str, Histogram>,
    counters: HashMap<&'static str, IntCounterVec>,
}

impl PrometheusSink {
    pub fn new() -> Result<Self> {
        use metric_names::*;

        let registry = Registry::new();
        let mut histograms = HashMap::new();
        let mut counters = HashMap::new();

        for (name, help) in [
            (REQUEST_LATENCY, "API request latency"),
            (PREDICTION_LATENCY, "Time spent in the prediction pipeline"),
            (MODEL_LOAD_TIME, "Model loading time"),
        ] {
            let histogram =
                Histogram::with_opts(HistogramOpts::new(name, help).buckets(LATENCY_BUCKETS.to_vec()))?;
            registry.register(Box::new(histogram.clone()))?;
            histograms.insert(name, histogram);
        }

        for (name, help, labels) in [
            (REQUEST_COUNT, "Total API requests", &["method", "endpoint", "status"][..]),
            (PREDICTION_COUNT, "Total predictions made", &["model_version"][..]),
            (PREDICTION_ERRORS, "Total rejected or failed predictions", &["kind"][..]),
            (MODEL_RELOADS, "Total model reload attempts", &["outcome"][..]),
        ] {
            let counter = IntCounterVec::new(Opts::new(name, help), labels)?;
            registry.register(Box::new(counter.clone()))?;
            counters.insert(name, counter);
        }

        Ok(Self {
            registry,
            histograms,
            counters,
        })
    }
}

impl MetricsSink for PrometheusSink {
    fn observe(&self, histogram: &str, value: f64) {
        match self.histograms.get(histogram) {
            Some(h) => h.observe(value),
            None => debug!(histogram = %histogram, "Unknown histogram"),
        }
    }

    fn increment(&self, counter: &str, labels: &[&str]) {
        let Some(vec) = self.counters.get(counter) else {
            debug!(counter = %counter, "Unknown counter");
            return;
        };
        match vec.get_metric_with_label_values(labels) {
            Ok(c) => c.inc(),
            Err(e) => warn!(counter = %counter, error = %e, "Invalid counter labels"),
        }
    }

    fn export(&self) -> Result<Option<String>> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(Some(String::from_utf8(buffer)?))
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for predictions, model loads
/// and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Log a prediction
    pub fn log_prediction(&self, class_name: &str, confidence: f64, model_version: &str) {
        info!(
            event = "prediction_made",
            service = %self.service,
            class_name = %class_name,
            confidence = confidence,
            model_version = %model_version,
            "Prediction made: {} (confidence: {:.3})",
            class_name,
            confidence
        );
    }

    /// Log a successful model load
    pub fn log_model_loaded(&self, provenance: &str, model_version: &str, load_secs: f64) {
        info!(
            event = "model_loaded",
            service = %self.service,
            provenance = %provenance,
            model_version = %model_version,
            load_secs = load_secs,
            "Model loaded successfully in {:.2} seconds",
            load_secs
        );
    }

    /// Log a failed model load
    pub fn log_model_load_failed(&self, error: &str, kept_version: Option<&str>) {
        match kept_version {
            Some(version) => warn!(
                event = "model_load_failed",
                service = %self.service,
                error = %error,
                kept_version = %version,
                "Failed to load model, keeping previous version"
            ),
            None => warn!(
                event = "model_load_failed",
                service = %self.service,
                error = %error,
                "Failed to load model, no model is active"
            ),
        }
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, addr: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            service_version = %version,
            addr = %addr,
            "Inference service started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Inference service shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::metric_names::*;
    use super::*;

    #[test]
    fn test_prometheus_sink_records() {
        let sink = PrometheusSink::new().unwrap();
        sink.observe(REQUEST_LATENCY, 0.002);
        sink.observe(MODEL_LOAD_TIME, 0.1);
        sink.increment(REQUEST_COUNT, &["POST", "/predict", "200"]);
        sink.increment(PREDICTION_COUNT, &["local"]);
        sink.increment(PREDICTION_COUNT, &["local"]);

        let text = sink.export().unwrap().unwrap();
        assert!(text.contains("api_request_duration_seconds_bucket"));
        assert!(text.contains("model_load_duration_seconds_count 1"));
        assert!(text.contains(r#"predictions_total{model_version="local"} 2"#));
        assert!(text.contains(r#"endpoint="/predict""#));
    }

    #[test]
    fn test_sinks_are_independent() {
        let a = PrometheusSink::new().unwrap();
        let b = PrometheusSink::new().unwrap();
        a.increment(MODEL_RELOADS, &["success"]);

        let text = b.export().unwrap().unwrap();
        assert!(!text.contains(r#"model_reloads_total{outcome="success"}"#));
    }

    #[test]
    fn test_unknown_names_and_bad_labels_ignored() {
        let sink = PrometheusSink::new().unwrap();
        sink.observe("no_such_histogram", 1.0);
        sink.increment("no_such_counter", &[]);
        sink.increment(REQUEST_COUNT, &["GET"]);
        assert!(sink.export().unwrap().is_some());
    }

    #[test]
    fn test_noop_sink_exports_nothing() {
        let sink = NoopSink;
        sink.observe(REQUEST_LATENCY, 1.0);
        sink.increment(REQUEST_COUNT, &["GET", "/health", "200"]);
        assert!(sink.export().unwrap().is_none());
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("iris-server");
        assert_eq!(logger.service, "iris-server");
    }
}
